//! Redis-backed window counter.
//!
//! The increment runs as a single Lua script, so concurrent callers on any
//! number of gateway instances see a consistent count and exactly one of
//! them starts the window.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::counter::{window_ttl_millis, CounterError, CounterOutcome, WindowCounter};

/// KEYS[1] = counter key, ARGV[1] = window in ms.
/// Returns `{count, repaired, ttl_ms}`.
const INCREMENT_SCRIPT: &str = r"
local current = redis.call('INCR', KEYS[1])
local ttl = redis.call('PTTL', KEYS[1])
local repaired = 0
if current == 1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
elseif ttl == -1 then
  redis.call('PEXPIRE', KEYS[1], ARGV[1])
  ttl = tonumber(ARGV[1])
  repaired = 1
end
return {current, repaired, ttl}
";

pub struct RedisWindowCounter {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    script: Script,
}

impl RedisWindowCounter {
    /// Parse the URL. No connection is made until the first increment.
    pub fn open(url: &str) -> Result<Self, CounterError> {
        let client = redis::Client::open(url)?;
        Ok(Self { client, conn: OnceCell::new(), script: Script::new(INCREMENT_SCRIPT) })
    }

    async fn connection(&self) -> Result<ConnectionManager, CounterError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                tracing::info!("[RateLimit] Connecting to Redis counter store");
                ConnectionManager::new(self.client.clone()).await
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl WindowCounter for RedisWindowCounter {
    async fn increment(&self, key: &str, window: Duration) -> Result<CounterOutcome, CounterError> {
        let window_ms = window_ttl_millis(window);
        let mut conn = self.connection().await?;

        // EVALSHA first, falling back to EVAL when the script is not cached.
        let (count, repaired, ttl): (i64, i64, i64) =
            self.script.key(key).arg(window_ms).invoke_async(&mut conn).await?;

        parse_reply(count, repaired, ttl)
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

fn parse_reply(count: i64, repaired: i64, ttl: i64) -> Result<CounterOutcome, CounterError> {
    let count = u64::try_from(count)
        .ok()
        .filter(|c| *c > 0)
        .ok_or_else(|| CounterError::MalformedReply(format!("count {count}")))?;
    Ok(CounterOutcome { count, ttl_millis: u64::try_from(ttl).unwrap_or(0), repaired: repaired == 1 })
}

impl std::fmt::Debug for RedisWindowCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisWindowCounter")
            .field("connected", &self.conn.initialized())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_bad_url() {
        assert!(RedisWindowCounter::open("not-a-url").is_err());
        assert!(RedisWindowCounter::open("redis://127.0.0.1:6379/0").is_ok());
    }

    #[test]
    fn test_parse_reply() {
        let outcome = parse_reply(3, 0, 1500).unwrap();
        assert_eq!(outcome, CounterOutcome { count: 3, ttl_millis: 1500, repaired: false });

        assert!(parse_reply(2, 1, 60_000).unwrap().repaired);
        // A key that vanished between INCR and PTTL reports -2.
        assert_eq!(parse_reply(2, 0, -2).unwrap().ttl_millis, 0);
        assert!(matches!(parse_reply(0, 0, 1), Err(CounterError::MalformedReply(_))));
    }
}
