//! Redis attempt ledger using one sorted set per key and outcome.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use uuid::Uuid;

use authgate_core::domain::{AttemptKey, AttemptOutcome, RecordId};
use authgate_core::ports::{AttemptLedger, FailureStats, LedgerError};

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., redis://localhost:6379)
    pub url: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Prefix for every ledger key
    pub key_prefix: String,
    /// Expiry refreshed on each append, so idle keys eventually vanish
    pub record_ttl: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            connect_timeout: Duration::from_secs(5),
            key_prefix: "authgate".to_string(),
            record_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl RedisConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("REDIS_URL").unwrap_or(defaults.url),
            connect_timeout: Duration::from_secs(
                std::env::var("REDIS_CONNECT_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            key_prefix: std::env::var("LEDGER_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            record_ttl: std::env::var("LEDGER_RETENTION_HOURS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(|h| Duration::from_secs(h * 60 * 60))
                .unwrap_or(defaults.record_ttl),
        }
    }
}

/// Redis-backed ledger.
///
/// Failures and successes for a key live in two sorted sets scored by
/// epoch milliseconds. Window statistics come from a single Lua call so
/// the count and the oldest member are read from the same snapshot.
pub struct RedisAttemptLedger {
    conn: ConnectionManager,
    config: RedisConfig,
    stats_script: Script,
}

impl RedisAttemptLedger {
    pub async fn new(config: RedisConfig) -> Result<Self, LedgerError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        let conn_manager_fut = ConnectionManager::new(client);
        let conn = tokio::time::timeout(config.connect_timeout, conn_manager_fut)
            .await
            .map_err(|_| LedgerError::Unavailable("Connection timed out".to_string()))?
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;

        // Returns: [count, oldest_score or -1]
        let stats_script = Script::new(
            r#"
            local key = KEYS[1]
            local min = '(' .. ARGV[1]

            local count = redis.call('ZCOUNT', key, min, '+inf')
            if count == 0 then
                return {0, -1}
            end

            local oldest = redis.call('ZRANGEBYSCORE', key, min, '+inf', 'WITHSCORES', 'LIMIT', 0, 1)
            return {count, tonumber(oldest[2])}
            "#,
        );

        tracing::info!(url = %config.url, prefix = %config.key_prefix, "Connected to Redis ledger");

        Ok(Self {
            conn,
            config,
            stats_script,
        })
    }

    /// Create from environment configuration.
    pub async fn from_env() -> Result<Self, LedgerError> {
        Self::new(RedisConfig::from_env()).await
    }

    fn make_key(&self, key: &AttemptKey, outcome: AttemptOutcome) -> String {
        format!(
            "{}:{}:{}",
            self.config.key_prefix,
            outcome.as_str(),
            key.storage_key()
        )
    }

    fn scan_pattern(&self) -> String {
        format!("{}:*", self.config.key_prefix)
    }
}

fn map_redis_err(err: redis::RedisError) -> LedgerError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
        LedgerError::Unavailable(err.to_string())
    } else {
        LedgerError::Query(err.to_string())
    }
}

fn from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[async_trait]
impl AttemptLedger for RedisAttemptLedger {
    async fn append(
        &self,
        key: &AttemptKey,
        outcome: AttemptOutcome,
        at: DateTime<Utc>,
    ) -> Result<RecordId, LedgerError> {
        let id = Uuid::new_v4();
        let redis_key = self.make_key(key, outcome);
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .zadd(&redis_key, id.to_string(), at.timestamp_millis())
            .ignore()
            .pexpire(&redis_key, self.config.record_ttl.as_millis() as i64)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(map_redis_err)?;

        Ok(id)
    }

    async fn failure_stats(
        &self,
        key: &AttemptKey,
        window_start: DateTime<Utc>,
    ) -> Result<FailureStats, LedgerError> {
        let redis_key = self.make_key(key, AttemptOutcome::Failure);
        let mut conn = self.conn.clone();

        let result: Vec<i64> = self
            .stats_script
            .key(&redis_key)
            .arg(window_start.timestamp_millis())
            .invoke_async(&mut conn)
            .await
            .map_err(map_redis_err)?;

        let count = result.first().copied().unwrap_or(0).max(0) as u64;
        let oldest = result
            .get(1)
            .copied()
            .filter(|ms| *ms >= 0)
            .and_then(from_millis);

        Ok(FailureStats { count, oldest })
    }

    async fn clear(&self, key: &AttemptKey) -> Result<(), LedgerError> {
        let mut conn = self.conn.clone();

        conn.del::<_, ()>(self.make_key(key, AttemptOutcome::Failure))
            .await
            .map_err(map_redis_err)?;
        Ok(())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64, LedgerError> {
        let keys: Vec<String> = {
            let mut scan_conn = self.conn.clone();
            let mut iter = scan_conn
                .scan_match::<_, String>(self.scan_pattern())
                .await
                .map_err(map_redis_err)?;

            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        let mut conn = self.conn.clone();
        let max = format!("({}", cutoff.timestamp_millis());
        let mut purged = 0u64;

        for key in keys {
            let removed: u64 = conn
                .zrembyscore(&key, "-inf", &max)
                .await
                .map_err(map_redis_err)?;
            purged += removed;
        }

        Ok(purged)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
