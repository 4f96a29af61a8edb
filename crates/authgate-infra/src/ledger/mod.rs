//! Attempt ledger implementations.

mod memory;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "redis")]
mod redis;

pub use memory::InMemoryAttemptLedger;

#[cfg(feature = "postgres")]
pub use postgres::PostgresAttemptLedger;

#[cfg(feature = "redis")]
pub use self::redis::{RedisAttemptLedger, RedisConfig};
