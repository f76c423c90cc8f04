use std::{future::Future, time::Duration};

use async_trait::async_trait;
use configs::StoreConfig;
use redis::{aio::ConnectionManager, AsyncCommands, ConnectionInfo, IntoConnectionInfo, RedisError, RedisResult, Script};
use tracing::{info, instrument, warn};

use super::{ListStore, StoreError};

/// Replace the list at KEYS[1] with ARGV[2] iff it currently equals ARGV[3..].
/// ARGV[1] is the expected length.
const COMPARE_AND_REPLACE: &str = r"
local current = redis.call('LRANGE', KEYS[1], 0, -1)
local n = tonumber(ARGV[1])
if #current ~= n then
  return 0
end
for i = 1, n do
  if current[i] ~= ARGV[i + 2] then
    return 0
  end
end
redis.call('DEL', KEYS[1])
redis.call('RPUSH', KEYS[1], ARGV[2])
return 1
";

/// Redis-backed list store.
///
/// Holds one `ConnectionManager`: a multiplexed connection that is cheap to
/// clone, safe to use from many tasks at once and reconnects on failure.
#[derive(Clone)]
pub struct RedisListStore {
    conn: ConnectionManager,
    swap: Script,
    op_timeout: Duration,
}

impl RedisListStore {
    /// Open the connection and verify it with a bounded PING.
    #[instrument(skip(cfg), fields(address = %cfg.address, db = cfg.db_index))]
    pub async fn connect(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let address = cfg.address.clone();
        let startup_err = |reason: String| StoreError::StartupConnect { address: address.clone(), reason };

        let info = connection_info(cfg).map_err(|e| startup_err(e.to_string()))?;
        let client = redis::Client::open(info).map_err(|e| startup_err(e.to_string()))?;

        let handshake = async {
            let mut conn = client.get_connection_manager().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, RedisError>(conn)
        };
        let conn = match tokio::time::timeout(cfg.connect_timeout(), handshake).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Err(startup_err(e.to_string())),
            Err(_) => return Err(startup_err(format!("no PING reply within {:?}", cfg.connect_timeout()))),
        };

        info!(address = %cfg.address, db = cfg.db_index, "connected to redis");
        Ok(Self {
            conn,
            swap: Script::new(COMPARE_AND_REPLACE),
            op_timeout: cfg.op_timeout(),
        })
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) => {
                warn!(op, error = %e, "redis command failed");
                Err(StoreError::Unavailable(e.to_string()))
            }
            Err(_) => {
                warn!(op, timeout = ?self.op_timeout, "redis command timed out");
                Err(StoreError::Timeout(self.op_timeout))
            }
        }
    }
}

fn connection_info(cfg: &StoreConfig) -> RedisResult<ConnectionInfo> {
    let (host, port) = cfg.host_port().ok_or_else(|| {
        RedisError::from((redis::ErrorKind::InvalidClientConfig, "store.address must be host:port"))
    })?;
    let mut info = (host, port).into_connection_info()?;
    info.redis.db = cfg.db_index;
    info.redis.password = cfg.credential().map(str::to_string);
    Ok(info)
}

#[async_trait]
impl ListStore for RedisListStore {
    async fn append(&self, key: &str, payload: String) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("rpush", async move {
            let _: i64 = conn.rpush(key, payload).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn read_all(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("lrange", async move {
            let blobs: Vec<String> = conn.lrange(key, 0, -1).await?;
            Ok::<_, RedisError>(blobs)
        })
        .await
    }

    async fn delete_key(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("del", async move {
            let _: i64 = conn.del(key).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn compare_and_replace(&self, key: &str, expected: &[String], payload: String) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let swap = &self.swap;
        self.bounded("compare_and_replace", async move {
            let mut invocation = swap.prepare_invoke();
            invocation.key(key).arg(expected.len()).arg(payload);
            for blob in expected {
                invocation.arg(blob.as_str());
            }
            let swapped: i64 = invocation.invoke_async(&mut conn).await?;
            Ok::<_, RedisError>(swapped == 1)
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        self.bounded("ping", async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> StoreConfig {
        let mut cfg = StoreConfig::default();
        if let Ok(addr) = std::env::var("REDIS_ADDR") {
            cfg.address = addr;
        }
        cfg.db_index = 15;
        cfg.connect_timeout_ms = 1000;
        cfg
    }

    async fn live_store() -> Option<RedisListStore> {
        if std::env::var("SKIP_REDIS_TESTS").is_ok() {
            return None;
        }
        match RedisListStore::connect(&test_config()).await {
            Ok(store) => Some(store),
            Err(e) => {
                eprintln!("skip: redis unavailable: {e}");
                None
            }
        }
    }

    #[tokio::test]
    async fn connect_to_closed_port_is_startup_error() {
        let cfg = StoreConfig {
            address: "127.0.0.1:1".into(),
            connect_timeout_ms: 500,
            ..StoreConfig::default()
        };
        match RedisListStore::connect(&cfg).await {
            Err(StoreError::StartupConnect { address, .. }) => assert_eq!(address, "127.0.0.1:1"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("connect to a closed port must fail"),
        }
    }

    /// Split one RESP command off the front of `buf`: its name and byte length.
    fn next_command(buf: &[u8]) -> Option<(String, usize)> {
        fn line(buf: &[u8], at: usize) -> Option<(&[u8], usize)> {
            let end = buf[at..].windows(2).position(|w| w == b"\r\n")? + at;
            Some((&buf[at..end], end + 2))
        }
        let (head, mut at) = line(buf, 0)?;
        let count: usize = std::str::from_utf8(head.strip_prefix(b"*")?).ok()?.parse().ok()?;
        let mut name = None;
        for _ in 0..count {
            let (len, start) = line(buf, at)?;
            let len: usize = std::str::from_utf8(len.strip_prefix(b"$")?).ok()?.parse().ok()?;
            let end = start + len;
            if buf.len() < end + 2 {
                return None;
            }
            name.get_or_insert_with(|| String::from_utf8_lossy(&buf[start..end]).into_owned());
            at = end + 2;
        }
        Some((name?, at))
    }

    /// A peer that replies PONG to every command except LRANGE, which it
    /// never answers.
    async fn stalling_peer() -> anyhow::Result<String> {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 4096];
                    loop {
                        let n = match sock.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        buf.extend_from_slice(&chunk[..n]);
                        while let Some((name, used)) = next_command(&buf) {
                            buf.drain(..used);
                            if !name.eq_ignore_ascii_case("LRANGE") && sock.write_all(b"+PONG\r\n").await.is_err() {
                                return;
                            }
                        }
                    }
                });
            }
        });
        Ok(addr)
    }

    #[tokio::test]
    async fn slow_command_times_out_as_unavailable() -> anyhow::Result<()> {
        let cfg = StoreConfig {
            address: stalling_peer().await?,
            connect_timeout_ms: 2000,
            op_timeout_ms: 50,
            ..StoreConfig::default()
        };
        let store = RedisListStore::connect(&cfg).await?;
        store.ping().await?;

        let err = match store.read_all("cart:slow").await {
            Err(e) => e,
            Ok(blobs) => panic!("stalled LRANGE returned {blobs:?}"),
        };
        assert!(matches!(err, StoreError::Timeout(d) if d == Duration::from_millis(50)));
        assert!(matches!(crate::errors::ServiceError::from(err), crate::errors::ServiceError::StoreUnavailable(_)));
        Ok(())
    }

    #[test]
    fn connection_info_carries_db_and_credential() -> anyhow::Result<()> {
        let cfg = StoreConfig {
            address: "cache.local:6380".into(),
            credential: "hunter2".into(),
            db_index: 3,
            ..StoreConfig::default()
        };
        let info = connection_info(&cfg)?;
        assert_eq!(info.redis.db, 3);
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
        Ok(())
    }

    #[tokio::test]
    async fn redis_list_round_trip() -> anyhow::Result<()> {
        let Some(store) = live_store().await else { return Ok(()) };
        let key = format!("test:list:{}", std::process::id());
        store.delete_key(&key).await?;

        assert!(store.read_all(&key).await?.is_empty());
        store.append(&key, "a".into()).await?;
        store.append(&key, "b".into()).await?;
        assert_eq!(store.read_all(&key).await?, vec!["a", "b"]);

        store.delete_key(&key).await?;
        assert!(store.read_all(&key).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn redis_compare_and_replace() -> anyhow::Result<()> {
        let Some(store) = live_store().await else { return Ok(()) };
        let key = format!("test:cas:{}", std::process::id());
        store.delete_key(&key).await?;

        assert!(store.compare_and_replace(&key, &[], "v1".into()).await?);
        assert!(!store.compare_and_replace(&key, &[], "v2".into()).await?);
        assert_eq!(store.read_all(&key).await?, vec!["v1"]);

        store.append(&key, "tail".into()).await?;
        let current = store.read_all(&key).await?;
        assert!(store.compare_and_replace(&key, &current, "v3".into()).await?);
        assert_eq!(store.read_all(&key).await?, vec!["v3"]);

        store.delete_key(&key).await?;
        Ok(())
    }
}
