use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use kitforge_catalog::RetryPolicy;
use kitforge_core::wipe::WipeCooldowns;
use kitforge_ledger::{LoaderOptions, LEDGER_FILE, WIPE_STATE_FILE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value \"{value}\": {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3020`).
    pub port: u16,
    /// Allowed CORS origins for admin tooling, validated at load.
    pub cors_origins: Vec<HeaderValue>,
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the listener closes.
    pub shutdown_timeout_secs: u64,
    /// Bearer token required on `/api/v1`; `None` disables the check.
    pub api_token: Option<String>,
    pub catalog: CatalogConfig,
    pub service: ServiceConfig,
}

/// Remote catalog endpoint.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub url: String,
    pub token: String,
    pub category_id: String,
    pub timeout_secs: u64,
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings of the kit service and its background tasks.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub retry_base_secs: u64,
    pub retry_max_attempts: u32,
    /// Keep serving the last good catalog while fetches are failing.
    pub serve_stale: bool,
    pub ledger_batch_size: usize,
    pub ledger_load_stale_days: i64,
    pub autosave_interval_secs: u64,
    pub sweep_interval_secs: u64,
    pub sweep_threshold_hours: i64,
    pub claim_min_interval_ms: i64,
    /// Kits tried, in order, when a player respawns.
    pub autokits: Vec<String>,
    /// Post-wipe lock per kit, in seconds.
    pub wipe_cooldowns: Vec<(String, u64)>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            retry_base_secs: 5,
            retry_max_attempts: 5,
            serve_stale: true,
            ledger_batch_size: 100,
            ledger_load_stale_days: 10,
            autosave_interval_secs: 300,
            sweep_interval_secs: 3_600,
            sweep_threshold_hours: 240,
            claim_min_interval_ms: 1_000,
            autokits: Vec::new(),
            wipe_cooldowns: Vec::new(),
        }
    }
}

impl ServiceConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(LEDGER_FILE)
    }

    pub fn wipe_state_path(&self) -> PathBuf {
        self.data_dir.join(WIPE_STATE_FILE)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base_delay: Duration::from_secs(self.retry_base_secs),
            max_attempts: self.retry_max_attempts,
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            batch_size: self.ledger_batch_size,
            stale_after_secs: self.ledger_load_stale_days.saturating_mul(86_400),
        }
    }

    pub fn claim_min_interval(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.claim_min_interval_ms)
    }

    pub fn sweep_threshold_secs(&self) -> i64 {
        self.sweep_threshold_hours.saturating_mul(3_600)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3020`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `10`                    |
    /// | `API_TOKEN`                  | unset (no auth)         |
    /// | `DATA_DIR`                   | `./data`                |
    /// | `CATALOG_URL`                | required                |
    /// | `CATALOG_TOKEN`              | required                |
    /// | `CATALOG_CATEGORY_ID`        | required                |
    /// | `CATALOG_TIMEOUT_SECS`       | `15`                    |
    /// | `CATALOG_RETRY_BASE_SECS`    | `5`                     |
    /// | `CATALOG_RETRY_MAX_ATTEMPTS` | `5`                     |
    /// | `CATALOG_SERVE_STALE`        | `true`                  |
    /// | `LEDGER_BATCH_SIZE`          | `100`                   |
    /// | `LEDGER_LOAD_STALE_DAYS`     | `10`                    |
    /// | `AUTOSAVE_INTERVAL_SECS`     | `300`                   |
    /// | `SWEEP_INTERVAL_SECS`        | `3600`                  |
    /// | `SWEEP_THRESHOLD_HOURS`      | `240`                   |
    /// | `CLAIM_MIN_INTERVAL_MS`      | `1000`                  |
    /// | `AUTOKITS`                   | empty                   |
    /// | `WIPE_COOLDOWNS`             | empty (`kit=secs,...`)  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = ServiceConfig::default();

        let wipe_raw = env.get("WIPE_COOLDOWNS").unwrap_or_default();
        let wipe_cooldowns =
            WipeCooldowns::parse_list(&wipe_raw).map_err(|e| ConfigError::Invalid {
                name: "WIPE_COOLDOWNS",
                value: wipe_raw.clone(),
                reason: e.to_string(),
            })?;

        let service = ServiceConfig {
            data_dir: env
                .get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            retry_base_secs: env.parse_or("CATALOG_RETRY_BASE_SECS", defaults.retry_base_secs)?,
            retry_max_attempts: env
                .parse_or("CATALOG_RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts)?,
            serve_stale: env.flag_or("CATALOG_SERVE_STALE", defaults.serve_stale)?,
            ledger_batch_size: env.parse_or("LEDGER_BATCH_SIZE", defaults.ledger_batch_size)?,
            ledger_load_stale_days: env
                .parse_or("LEDGER_LOAD_STALE_DAYS", defaults.ledger_load_stale_days)?,
            autosave_interval_secs: env
                .parse_or("AUTOSAVE_INTERVAL_SECS", defaults.autosave_interval_secs)?,
            sweep_interval_secs: env.parse_or("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs)?,
            sweep_threshold_hours: env
                .parse_or("SWEEP_THRESHOLD_HOURS", defaults.sweep_threshold_hours)?,
            claim_min_interval_ms: env
                .parse_or("CLAIM_MIN_INTERVAL_MS", defaults.claim_min_interval_ms)?,
            autokits: env.list("AUTOKITS"),
            wipe_cooldowns,
        };

        if service.autosave_interval_secs == 0 || service.sweep_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "AUTOSAVE_INTERVAL_SECS/SWEEP_INTERVAL_SECS",
                value: "0".into(),
                reason: "intervals must be positive".into(),
            });
        }

        let catalog = CatalogConfig {
            url: env.require("CATALOG_URL")?,
            token: env.require("CATALOG_TOKEN")?,
            category_id: env.require("CATALOG_CATEGORY_ID")?,
            timeout_secs: env.parse_or("CATALOG_TIMEOUT_SECS", 15)?,
        };

        Ok(Self {
            host: env.get("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: env.parse_or("PORT", 3020)?,
            cors_origins: env.origins("CORS_ORIGINS", "http://localhost:5173")?,
            request_timeout_secs: env.parse_or("REQUEST_TIMEOUT_SECS", 30)?,
            shutdown_timeout_secs: env.parse_or("SHUTDOWN_TIMEOUT_SECS", 10)?,
            api_token: env.get("API_TOKEN").filter(|t| !t.trim().is_empty()),
            catalog,
            service,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }

    fn require(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn flag_or(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    name,
                    value: raw,
                    reason: "expected true or false".into(),
                }),
            },
        }
    }

    fn origins(&self, name: &'static str, default: &str) -> Result<Vec<HeaderValue>, ConfigError> {
        let raw = self.get(name).unwrap_or_else(|| default.to_string());
        split_list(&raw)
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(&origin).map_err(|e| ConfigError::Invalid {
                    name,
                    value: origin.clone(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    fn list(&self, name: &str) -> Vec<String> {
        self.get(name).map(|raw| split_list(&raw)).unwrap_or_default()
    }
}
