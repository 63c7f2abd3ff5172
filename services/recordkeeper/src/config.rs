//! Recordkeeper configuration.
//!
//! Values come from `ROSTER_*` environment variables; a YAML file named by
//! `ROSTER_CONFIG` may override any of them and may also carry the rank level
//! table.
use anyhow::{Context, Result, bail};
use roster_authz::{Rank, RankLevels};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;

const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_ISSUER: &str = "recordkeeper";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "postgres" => Ok(Self::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RecordkeeperConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub session: SessionConfig,
    pub default_page_size: u32,
    pub rank_levels: RankLevels,
}

#[derive(Debug, Default, Deserialize)]
struct RecordkeeperConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    postgres_url: Option<String>,
    postgres_max_connections: Option<u32>,
    session_issuer: Option<String>,
    default_page_size: Option<u32>,
    rank_levels: Option<HashMap<Rank, u32>>,
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}

impl RecordkeeperConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("ROSTER_BIND", SocketAddr::from(([0, 0, 0, 0], 8443)))?;
        let metrics_bind = env_or("ROSTER_METRICS_BIND", SocketAddr::from(([0, 0, 0, 0], 8080)))?;
        let storage = match std::env::var("ROSTER_STORAGE") {
            Ok(value) => StorageBackend::parse(&value).with_context(|| "parse ROSTER_STORAGE")?,
            Err(_) => StorageBackend::Memory,
        };
        let postgres = match std::env::var("ROSTER_POSTGRES_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_or("ROSTER_POSTGRES_MAX_CONNECTIONS", 10)?,
                connect_timeout_ms: env_or("ROSTER_POSTGRES_CONNECT_TIMEOUT_MS", 5_000)?,
                acquire_timeout_ms: env_or("ROSTER_POSTGRES_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        let secret = std::env::var("ROSTER_SESSION_SECRET")
            .with_context(|| "ROSTER_SESSION_SECRET must be set")?;
        if secret.is_empty() {
            bail!("ROSTER_SESSION_SECRET must not be empty");
        }
        let issuer =
            std::env::var("ROSTER_SESSION_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let default_page_size = env_or("ROSTER_DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if default_page_size == 0 {
            bail!("ROSTER_DEFAULT_PAGE_SIZE must be positive");
        }
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            session: SessionConfig { secret, issuer },
            default_page_size,
            rank_levels: RankLevels::default(),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("ROSTER_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read ROSTER_CONFIG: {path}"))?;
            let override_cfg: RecordkeeperConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse recordkeeper config yaml")?;
            config.apply(override_cfg)?;
        }
        Ok(config)
    }

    fn apply(&mut self, override_cfg: RecordkeeperConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = StorageBackend::parse(&value).with_context(|| "parse storage")?;
        }
        if let Some(url) = override_cfg.postgres_url {
            match self.postgres.as_mut() {
                Some(pg) => pg.url = url,
                None => {
                    self.postgres = Some(PostgresConfig {
                        url,
                        max_connections: 10,
                        connect_timeout_ms: 5_000,
                        acquire_timeout_ms: 5_000,
                    })
                }
            }
        }
        if let (Some(value), Some(pg)) = (override_cfg.postgres_max_connections, self.postgres.as_mut())
        {
            pg.max_connections = value;
        }
        if let Some(value) = override_cfg.session_issuer {
            self.session.issuer = value;
        }
        if let Some(value) = override_cfg.default_page_size {
            if value == 0 {
                bail!("default_page_size must be positive");
            }
            self.default_page_size = value;
        }
        if let Some(levels) = override_cfg.rank_levels {
            self.rank_levels =
                RankLevels::from_entries(levels).with_context(|| "parse rank_levels")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    fn clean_env() -> Vec<EnvGuard> {
        [
            "ROSTER_BIND",
            "ROSTER_METRICS_BIND",
            "ROSTER_STORAGE",
            "ROSTER_POSTGRES_URL",
            "ROSTER_POSTGRES_MAX_CONNECTIONS",
            "ROSTER_POSTGRES_CONNECT_TIMEOUT_MS",
            "ROSTER_POSTGRES_ACQUIRE_TIMEOUT_MS",
            "ROSTER_SESSION_ISSUER",
            "ROSTER_DEFAULT_PAGE_SIZE",
            "ROSTER_CONFIG",
        ]
        .into_iter()
        .map(EnvGuard::unset)
        .collect()
    }

    #[test]
    #[serial]
    fn defaults_apply_when_env_is_empty() {
        let _clean = clean_env();
        let _secret = EnvGuard::set("ROSTER_SESSION_SECRET", "s3cret");
        let config = RecordkeeperConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, "0.0.0.0:8443".parse().unwrap());
        assert_eq!(config.metrics_bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
        assert_eq!(config.session.issuer, "recordkeeper");
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.rank_levels, RankLevels::default());
    }

    #[test]
    #[serial]
    fn session_secret_is_required() {
        let _clean = clean_env();
        let _secret = EnvGuard::unset("ROSTER_SESSION_SECRET");
        let err = RecordkeeperConfig::from_env().expect_err("missing secret");
        assert!(err.to_string().contains("ROSTER_SESSION_SECRET"));
    }

    #[test]
    #[serial]
    fn env_selects_postgres() {
        let _clean = clean_env();
        let _secret = EnvGuard::set("ROSTER_SESSION_SECRET", "s3cret");
        let _storage = EnvGuard::set("ROSTER_STORAGE", "Postgres");
        let _url = EnvGuard::set("ROSTER_POSTGRES_URL", "postgres://localhost/roster");
        let _max = EnvGuard::set("ROSTER_POSTGRES_MAX_CONNECTIONS", "3");
        let config = RecordkeeperConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://localhost/roster");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.connect_timeout_ms, 5_000);
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        let _clean = clean_env();
        let _secret = EnvGuard::set("ROSTER_SESSION_SECRET", "s3cret");
        {
            let _bind = EnvGuard::set("ROSTER_BIND", "not-an-addr");
            let err = RecordkeeperConfig::from_env().expect_err("bad bind");
            assert!(err.to_string().contains("ROSTER_BIND"));
        }
        {
            let _storage = EnvGuard::set("ROSTER_STORAGE", "sqlite");
            assert!(RecordkeeperConfig::from_env().is_err());
        }
        let _page = EnvGuard::set("ROSTER_DEFAULT_PAGE_SIZE", "0");
        assert!(RecordkeeperConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn yaml_overrides_env_and_rank_levels() {
        let _clean = clean_env();
        let _secret = EnvGuard::set("ROSTER_SESSION_SECRET", "s3cret");
        let path = std::env::temp_dir().join(format!("roster-config-{}.yaml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).expect("create yaml");
        writeln!(
            file,
            "bind_addr: 127.0.0.1:9000\ndefault_page_size: 5\nsession_issuer: roster-test\n\
             rank_levels:\n  PROBATIONARY_PILOT: 1\n  PILOT: 2\n  EXPERIENCED_PILOT: 3\n  \
             SENIOR_PILOT: 4\n  VETERAN_PILOT: 5\n  SUB_COMMAND: 6\n  COMMAND: 7"
        )
        .expect("write yaml");
        let _config_path = EnvGuard::set("ROSTER_CONFIG", path.to_str().expect("utf8 path"));

        let config = RecordkeeperConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.default_page_size, 5);
        assert_eq!(config.session.issuer, "roster-test");
        assert_eq!(config.rank_levels.level(Rank::Command), 7);
        assert_eq!(config.rank_levels.level(Rank::ProbationaryPilot), 1);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    #[serial]
    fn yaml_rejects_incomplete_rank_table() {
        let _clean = clean_env();
        let _secret = EnvGuard::set("ROSTER_SESSION_SECRET", "s3cret");
        let path = std::env::temp_dir().join(format!("roster-config-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "rank_levels:\n  PILOT: 2\n").expect("write yaml");
        let _config_path = EnvGuard::set("ROSTER_CONFIG", path.to_str().expect("utf8 path"));
        let err = RecordkeeperConfig::from_env_or_yaml().expect_err("incomplete");
        assert!(err.to_string().contains("rank_levels"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn session_debug_hides_secret() {
        let session = SessionConfig {
            secret: "hunter2".into(),
            issuer: "recordkeeper".into(),
        };
        assert!(!format!("{session:?}").contains("hunter2"));
    }
}
