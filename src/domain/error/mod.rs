// SPDX-License-Identifier: MPL-2.0
//! Domain error types.
//!
//! One error enum per pipeline component. Each variant renders a
//! human-readable message suitable for showing to the user.

mod crop;
mod export;
mod load;

pub use crop::CropError;
pub use export::ExportError;
pub use load::LoadError;
