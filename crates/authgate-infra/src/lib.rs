//! # Authgate Infrastructure
//!
//! Concrete implementations of the ports defined in `authgate-core`:
//! attempt ledgers, credential verifiers, notifiers and the request throttle.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL attempt ledger via SeaORM
//! - `redis` - Redis attempt ledger
//! - `auth` - Local verifier (Argon2 + JWT)
//! - `identity` - Hosted identity service verifier
//! - `mail` - Mail API notifier
//! - `rate-limit` - Per-address request throttle via governor

pub mod database;
pub mod ledger;
pub mod notify;
pub mod verifier;

#[cfg(feature = "rate-limit")]
pub mod throttle;

// Re-exports - In-Memory
pub use database::DatabaseConfig;
pub use ledger::InMemoryAttemptLedger;
pub use notify::LogNotifier;

#[cfg(feature = "postgres")]
pub use ledger::PostgresAttemptLedger;

#[cfg(feature = "redis")]
pub use ledger::{RedisAttemptLedger, RedisConfig};

#[cfg(feature = "auth")]
pub use verifier::{JwtConfig, JwtSessionIssuer, LocalVerifier};

#[cfg(feature = "identity")]
pub use verifier::{IdentityConfig, IdentityServiceVerifier};

#[cfg(feature = "mail")]
pub use notify::{MailApiNotifier, MailConfig};

#[cfg(feature = "rate-limit")]
pub use throttle::{RequestThrottle, ThrottleDecision};
