//! Redis-backed store using WATCH/MULTI/EXEC for compare-and-swap.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use deadpool_redis::redis::{cmd, pipe, AsyncCommands, Script};
use deadpool_redis::{Config, Connection, Pool, Runtime};

use crate::error::{ConfigError, ConnectionError, Result, StorageError};
use crate::limit_data::LimitData;
use crate::storage::Store;

/// Redis connection configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL. Scheme must be `redis`, `rediss`, or `unix`.
    pub url: String,
    /// Connection pool size.
    pub pool_size: usize,
    /// Key prefix applied to every rate-limit key.
    pub key_prefix: String,
    /// Timeout used when acquiring a pooled connection.
    pub connection_timeout: Duration,
}

impl RedisConfig {
    /// Build a configuration from a URL, validating its scheme.
    ///
    /// Returns [`ConfigError::InvalidStoreUrl`] unless the scheme is one of
    /// `redis`, `rediss` (TLS), or `unix`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        validate_scheme(&url)?;
        Ok(Self {
            url,
            pool_size: 10,
            key_prefix: "rl:".to_string(),
            connection_timeout: Duration::from_secs(5),
        })
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }
}

fn validate_scheme(url: &str) -> Result<()> {
    let scheme = url.split_once("://").map(|(scheme, _)| scheme);
    match scheme {
        Some("redis") | Some("rediss") | Some("unix") => Ok(()),
        _ => Err(ConfigError::InvalidStoreUrl {
            url: url.to_string(),
            detail: "expected a redis://, rediss://, or unix:// scheme".to_string(),
        }
        .into()),
    }
}

/// Jan 1 2017, used to rebase Redis's `TIME` so the fast-path Lua scripts
/// stay within `f64`-safe range until roughly 2048.
const GCRA_EPOCH: i64 = 1_483_228_800;

/// Remote-execution GCRA script: read-only, used for `qty == 0` peeks.
/// Mirrors the apply script's math without ever writing the key.
const GCRA_CHECK_SCRIPT: &str = r#"
local key = KEYS[1]
local emission_interval = tonumber(ARGV[1])
local burst_offset = tonumber(ARGV[2])
local increment = tonumber(ARGV[3])
local jan_1_2017 = tonumber(ARGV[4])

local time = redis.call("TIME")
local now = (tonumber(time[1]) - jan_1_2017) + (tonumber(time[2]) / 1000000)

local tat = redis.call("GET", key)
if not tat then
  tat = now
else
  tat = tonumber(tat)
end
tat = math.max(tat, now)

local new_tat = tat + increment
local allow_at = new_tat - burst_offset
local diff = now - allow_at

local remaining = math.floor((diff / emission_interval) + 0.5)
if remaining < 1 then
  local reset_after = tat - now
  if reset_after == 0 then
    reset_after = -1
  end
  return {0, 0, tostring(reset_after), tostring(diff * -1)}
end

local reset_after = new_tat - now
if reset_after == 0 then
  reset_after = -1
end

return {1, remaining, tostring(reset_after), tostring(-1)}
"#;

/// Remote-execution GCRA script: reads, decides, and on success advances
/// the TAT with `EXPIRE` set to `ceil(reset_after)`.
const GCRA_APPLY_SCRIPT: &str = r#"
local key = KEYS[1]
local emission_interval = tonumber(ARGV[1])
local burst_offset = tonumber(ARGV[2])
local increment = tonumber(ARGV[3])
local jan_1_2017 = tonumber(ARGV[4])

local time = redis.call("TIME")
local now = (tonumber(time[1]) - jan_1_2017) + (tonumber(time[2]) / 1000000)

local tat = redis.call("GET", key)
if not tat then
  tat = now
else
  tat = tonumber(tat)
end
tat = math.max(tat, now)

local new_tat = tat + increment
local allow_at = new_tat - burst_offset
local diff = now - allow_at

local remaining = math.floor((diff / emission_interval) + 0.5)
if remaining < 1 then
  local reset_after = tat - now
  if reset_after == 0 then
    reset_after = -1
  end
  return {0, 0, tostring(reset_after), tostring(diff * -1)}
end

local reset_after = new_tat - now
if reset_after > 0 then
  redis.call("SET", key, new_tat, "EX", math.ceil(reset_after))
end
if reset_after == 0 then
  reset_after = -1
end

return {1, remaining, tostring(reset_after), tostring(-1)}
"#;

/// Redis-backed [`Store`] implementation.
///
/// Generic compare-and-swap goes through `WATCH`/`HGETALL`/`MULTI`+`HSET`/
/// `EXEC`. [`GCRALimiter`](crate::limiter::GCRALimiter) additionally uses
/// [`Store::gcra_fast_path`] to run the whole decision as a single Lua
/// script, avoiding the watch round-trip entirely.
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisStore {
    /// Connect using the given configuration.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        let mut conn = pool
            .get()
            .await
            .map_err(|_| ConnectionError::PoolExhausted)?;
        let _: () = cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| ConnectionError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix,
        })
    }

    /// Connect using a bare URL (scheme-validated, default pool settings).
    pub async fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(RedisConfig::new(url)?).await
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn conn(&self) -> Result<Connection> {
        self.pool
            .get()
            .await
            .map_err(|_| StorageError::operation_failed("pool exhausted", true).into())
    }

    fn decode_fields(fields: &HashMap<String, String>) -> Result<Option<LimitData>> {
        if fields.is_empty() {
            return Ok(None);
        }
        let get = |name: &str| fields.get(name).map(String::as_str).unwrap_or("");
        LimitData::decode(get("used"), get("remaining"), get("created_at"), get("time"))
            .map(Some)
            .map_err(|e| StorageError::Serialization(e.to_string()).into())
    }

}

impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<LimitData>> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = conn
            .hgetall(&full_key)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;
        Self::decode_fields(&fields)
    }

    async fn set(&self, key: &str, data: LimitData) -> Result<LimitData> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;
        let encoded = data.encode();
        conn.hset_multiple::<_, _, _, ()>(&full_key, &encoded)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;
        Ok(data)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        old: Option<LimitData>,
        new: LimitData,
    ) -> Result<LimitData> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;

        cmd("WATCH")
            .arg(&full_key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;

        let fields: HashMap<String, String> = conn
            .hgetall(&full_key)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;
        let current = Self::decode_fields(&fields)?;

        if current != old {
            let _: std::result::Result<(), _> = cmd("UNWATCH").query_async(&mut conn).await;
            return Err(StorageError::CompareAndSwapMismatch { observed: current }.into());
        }

        let encoded = new.encode();
        let mut transaction = pipe();
        transaction.atomic();
        transaction.hset_multiple(&full_key, &encoded);

        let result: Option<()> = transaction
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;

        match result {
            Some(()) => Ok(new),
            None => Err(StorageError::ConcurrentStoreMutation {
                source: format!("key {full_key:?} changed between WATCH and EXEC").into(),
            }
            .into()),
        }
    }

    async fn current_time(&self) -> Result<DateTime<Utc>> {
        let mut conn = self.conn().await?;
        let (secs, micros): (i64, i64) = cmd("TIME")
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;
        Utc.timestamp_opt(secs, (micros * 1_000) as u32)
            .single()
            .ok_or_else(|| StorageError::operation_failed("redis TIME out of range", false).into())
    }

    /// Runs the decision and (on success) the TAT advance as a single Lua
    /// script, rebasing Redis's clock to the GCRA epoch. `write = false`
    /// selects the read-only script used for `qty == 0` peeks.
    async fn gcra_fast_path(
        &self,
        key: &str,
        emission_interval: f64,
        burst_offset: f64,
        increment: f64,
        write: bool,
    ) -> Result<Option<(bool, f64, Option<Duration>, Option<Duration>)>> {
        let full_key = self.full_key(key);
        let mut conn = self.conn().await?;

        let script = Script::new(if write {
            GCRA_APPLY_SCRIPT
        } else {
            GCRA_CHECK_SCRIPT
        });

        let (allowed, remaining, reset_after, retry_after): (i64, f64, String, String) = script
            .key(&full_key)
            .arg(emission_interval)
            .arg(burst_offset)
            .arg(increment)
            .arg(GCRA_EPOCH)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| StorageError::operation_failed(e.to_string(), true))?;

        let parse_secs = |s: &str| -> Option<Duration> {
            s.parse::<f64>()
                .ok()
                .filter(|v| *v >= 0.0)
                .map(Duration::from_secs_f64)
        };

        Ok(Some((
            allowed == 1,
            remaining.max(0.0),
            parse_secs(&reset_after),
            parse_secs(&retry_after),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_validates_scheme() {
        assert!(RedisConfig::new("redis://localhost:6379").is_ok());
        assert!(RedisConfig::new("rediss://localhost:6379").is_ok());
        assert!(RedisConfig::new("unix:///tmp/redis.sock").is_ok());
        assert!(RedisConfig::new("http://localhost:6379").is_err());
        assert!(RedisConfig::new("localhost:6379").is_err());
    }

    #[test]
    fn test_redis_config_builder() {
        let config = RedisConfig::new("redis://localhost:6380")
            .unwrap()
            .with_prefix("test:")
            .with_pool_size(5);

        assert_eq!(config.url, "redis://localhost:6380");
        assert_eq!(config.key_prefix, "test:");
        assert_eq!(config.pool_size, 5);
    }

    #[test]
    fn test_decode_fields_empty_is_absent() {
        let fields = HashMap::new();
        assert_eq!(RedisStore::decode_fields(&fields).unwrap(), None);
    }
}
