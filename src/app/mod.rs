// SPDX-License-Identifier: MPL-2.0
//! Application-level glue shared by the library and the command-line tool.

pub mod paths;
