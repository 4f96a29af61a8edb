//! Credential verifier implementations.

#[cfg(feature = "auth")]
mod jwt;
#[cfg(feature = "auth")]
mod local;
#[cfg(feature = "auth")]
mod password;

#[cfg(feature = "identity")]
mod identity_service;

#[cfg(feature = "auth")]
pub use jwt::{JwtConfig, JwtSessionIssuer};
#[cfg(feature = "auth")]
pub use local::LocalVerifier;

#[cfg(feature = "identity")]
pub use identity_service::{IdentityConfig, IdentityServiceVerifier};
