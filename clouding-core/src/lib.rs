//! Core types for the Clouding dashboard gateway.
//!
//! Backend entities are opaque JSON; this crate only defines the values the
//! gateway itself validates: resource IDs, access tokens, deployment types,
//! caller identity and credential expiry timestamps.

#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]

pub mod deployment;
pub mod error;
pub mod expiry;
pub mod id;
pub mod identity;

pub use deployment::DeploymentType;
pub use error::CoreError;
pub use id::{AccessToken, ResourceId};
pub use identity::{AuthenticatedUser, IdentityClaims};
