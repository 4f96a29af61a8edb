//! # Authgate Core
//!
//! The domain layer of the authentication gateway: attempt keys and records,
//! the trailing-window counter, the rate limiter and the gateway itself.
//! Storage, verifiers and notifiers are reached only through [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;

pub use error::{GatewayError, PolicyError};
pub use services::{AuthGateway, AuthRequest, GatewayConfig};
