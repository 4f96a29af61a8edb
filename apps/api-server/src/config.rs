//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;

use authgate_core::domain::WindowPolicy;
use authgate_core::{GatewayConfig, PolicyError};

/// Longest record retention accepted: ten years.
const MAX_RETENTION_HOURS: i64 = 10 * 365 * 24;

/// Which attempt ledger backs the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Memory,
    Postgres,
    Redis,
}

impl FromStr for LedgerBackend {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(LedgerBackend::Memory),
            "postgres" | "postgresql" => Ok(LedgerBackend::Postgres),
            "redis" => Ok(LedgerBackend::Redis),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Configuration errors, raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("Invalid gateway policy: {0}")]
    Policy(#[from] PolicyError),

    #[error("{var} is out of range: {value}")]
    OutOfRange { var: &'static str, value: i64 },

    #[error("Unknown LEDGER_BACKEND {0:?} (expected memory, postgres or redis)")]
    UnknownBackend(String),

    #[error("LEDGER_RETENTION_HOURS ({retention_hours}h) must cover the {window_minutes} minute window")]
    RetentionTooShort {
        retention_hours: i64,
        window_minutes: i64,
    },
}

/// Ledger compaction settings.
#[derive(Debug, Clone)]
pub struct CompactionConfig {
    pub retention: TimeDelta,
    pub cron: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub gateway: GatewayConfig,
    pub ledger_backend: LedgerBackend,
    pub compaction: CompactionConfig,
    /// Requests per minute per address; 0 disables the throttle.
    pub throttle_per_minute: u32,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let window_minutes: i64 = parse_or(&lookup, "AUTH_WINDOW_MINUTES", 15)?;
        let max_attempts: u32 = parse_or(&lookup, "AUTH_MAX_ATTEMPTS", 5)?;
        let verifier_timeout_secs: u64 = parse_or(&lookup, "AUTH_VERIFIER_TIMEOUT_SECS", 10)?;

        let policy = WindowPolicy::new(window_minutes, max_attempts);
        policy.validate()?;

        let retention_hours: i64 = parse_or(&lookup, "LEDGER_RETENTION_HOURS", 24)?;
        let retention = TimeDelta::try_hours(retention_hours)
            .filter(|_| retention_hours <= MAX_RETENTION_HOURS)
            .ok_or(ConfigError::OutOfRange {
                var: "LEDGER_RETENTION_HOURS",
                value: retention_hours,
            })?;
        if retention < policy.window {
            return Err(ConfigError::RetentionTooShort {
                retention_hours,
                window_minutes,
            });
        }

        let ledger_backend = match lookup("LEDGER_BACKEND") {
            Some(value) => value.parse()?,
            None => LedgerBackend::Memory,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            gateway: GatewayConfig {
                policy,
                verifier_timeout: Duration::from_secs(verifier_timeout_secs),
            },
            ledger_backend,
            compaction: CompactionConfig {
                retention,
                cron: lookup("LEDGER_COMPACTION_CRON")
                    .unwrap_or_else(|| "0 */10 * * * *".to_string()),
            },
            throttle_per_minute: parse_or(&lookup, "REQUEST_THROTTLE_PER_MINUTE", 120)?,
        })
    }
}
