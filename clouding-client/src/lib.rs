//! HTTP client for the Clouding backend service.
//!
//! Builds outbound requests, attaches the caller's bearer token and maps
//! non-2xx responses to a typed [`BackendError::Status`].

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod client;
pub mod error;
mod response;

pub use client::BackendClient;
pub use error::BackendError;
pub use hyper::{Method, StatusCode};
