//! HTTP gateway of the Clouding infrastructure dashboard.
//!
//! Authenticates callers, forwards blueprint, deployment, host, credential,
//! component, user and metrics calls to the backend service, and turns every
//! failure into a JSON error response.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
