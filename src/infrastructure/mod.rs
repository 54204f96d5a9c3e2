// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`, wrapping external dependencies like the HTTP client.
//!
//! - [`http`]: reqwest-backed loading (implements [`ImageLoader`])
//! - [`ticket`]: cancellable fire-once loads on the tokio runtime
//!
//! [`ImageLoader`]: crate::application::port::ImageLoader

pub mod http;
pub mod ticket;

pub use http::HttpImageLoader;
pub use ticket::{spawn_load, LoadTicket};
