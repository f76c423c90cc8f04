use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cart: CartConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redis,
    /// In-process store; carts are lost on restart.
    Memory,
}

/// Connection settings for the key-value store holding carts.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// `host:port`
    #[serde(default = "default_address")]
    pub address: String,
    /// AUTH secret; empty means no credential.
    #[serde(default)]
    pub credential: String,
    #[serde(default)]
    pub db_index: i64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            address: default_address(),
            credential: String::new(),
            db_index: 0,
            connect_timeout_ms: default_connect_timeout_ms(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartConfig {
    /// Upper bound on optimistic read-modify-write rounds per add-item call.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u32,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self { max_write_attempts: default_max_write_attempts() }
    }
}

fn default_address() -> String { "localhost:6379".into() }
fn default_connect_timeout_ms() -> u64 { 5000 }
fn default_op_timeout_ms() -> u64 { 2000 }
fn default_max_write_attempts() -> u32 { 16 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (defaults when the file is absent), apply env overrides, validate.
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if is_not_found(&e) => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Overlay values from the environment. The lookup is injected so tests
    /// do not have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.server.worker_threads = Some(w);
        }
        if let Some(addr) = lookup("REDIS_ADDR") {
            self.store.address = addr;
        }
        if let Some(pw) = lookup("REDIS_PASSWORD") {
            self.store.credential = pw;
        }
        if let Some(db) = lookup("REDIS_DB").and_then(|v| v.parse::<i64>().ok()) {
            self.store.db_index = db;
        }
        match lookup("STORE_BACKEND").as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("memory") => self.store.backend = StoreBackend::Memory,
            Some("redis") => self.store.backend = StoreBackend::Redis,
            _ => {}
        }
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.store.validate()?;
        self.cart.validate()?;
        Ok(())
    }
}

fn is_not_found(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        let addr = self.address.trim();
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("store.address must be host:port, got {addr:?}"))?;
        if host.is_empty() {
            return Err(anyhow!("store.address is missing a host"));
        }
        match port.parse::<u16>() {
            Ok(p) if p != 0 => {}
            _ => return Err(anyhow!("store.address has an invalid port: {port:?}")),
        }
        if self.db_index < 0 {
            return Err(anyhow!("store.db_index must be >= 0"));
        }
        if self.connect_timeout_ms == 0 || self.op_timeout_ms == 0 {
            return Err(anyhow!("store timeouts must be positive milliseconds"));
        }
        Ok(())
    }

    /// Split `address` into host and port. Only meaningful after `validate`.
    pub fn host_port(&self) -> Option<(String, u16)> {
        let (host, port) = self.address.trim().rsplit_once(':')?;
        Some((host.to_string(), port.parse().ok()?))
    }

    pub fn credential(&self) -> Option<&str> {
        let c = self.credential.as_str();
        (!c.is_empty()).then_some(c)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

impl CartConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_write_attempts == 0 {
            return Err(anyhow!("cart.max_write_attempts must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_yields_defaults() -> Result<()> {
        let mut cfg: AppConfig = toml::from_str("")?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.store.address, "localhost:6379");
        assert_eq!(cfg.store.backend, StoreBackend::Redis);
        assert_eq!(cfg.store.credential(), None);
        assert_eq!(cfg.store.db_index, 0);
        assert_eq!(cfg.cart.max_write_attempts, 16);
        Ok(())
    }

    #[test]
    fn parses_full_file() -> Result<()> {
        let src = r#"
            [server]
            host = "0.0.0.0"
            port = 9000
            worker_threads = 2

            [store]
            backend = "memory"
            address = "redis.internal:6380"
            credential = "s3cret"
            db_index = 3
            connect_timeout_ms = 100
            op_timeout_ms = 50

            [cart]
            max_write_attempts = 4
        "#;
        let mut cfg: AppConfig = toml::from_str(src)?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.worker_threads, Some(2));
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        assert_eq!(cfg.store.host_port(), Some(("redis.internal".to_string(), 6380)));
        assert_eq!(cfg.store.credential(), Some("s3cret"));
        assert_eq!(cfg.store.op_timeout(), Duration::from_millis(50));
        assert_eq!(cfg.cart.max_write_attempts, 4);
        Ok(())
    }

    #[test]
    fn env_overrides_win() -> Result<()> {
        let env: HashMap<&str, &str> = HashMap::from([
            ("REDIS_ADDR", "10.0.0.5:7000"),
            ("REDIS_PASSWORD", "pw"),
            ("REDIS_DB", "2"),
            ("SERVER_PORT", "8181"),
            ("STORE_BACKEND", "Memory"),
        ]);
        let mut cfg = AppConfig::default();
        cfg.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.store.address, "10.0.0.5:7000");
        assert_eq!(cfg.store.credential(), Some("pw"));
        assert_eq!(cfg.store.db_index, 2);
        assert_eq!(cfg.server.port, 8181);
        assert_eq!(cfg.store.backend, StoreBackend::Memory);
        Ok(())
    }

    #[test]
    fn rejects_bad_store_address() {
        for addr in ["localhost", ":6379", "localhost:0", "localhost:port"] {
            let store = StoreConfig { address: addr.into(), ..StoreConfig::default() };
            assert!(store.validate().is_err(), "{addr} should be rejected");
        }
    }

    #[test]
    fn rejects_zero_attempts_and_timeouts() {
        let mut cfg = AppConfig::default();
        cfg.cart.max_write_attempts = 0;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.store.op_timeout_ms = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn zero_worker_threads_normalized() -> Result<()> {
        let mut cfg = AppConfig::default();
        cfg.server.worker_threads = Some(0);
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.worker_threads, Some(4));
        Ok(())
    }
}
