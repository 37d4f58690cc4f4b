use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::auth::jwt::{KeyError, ServiceAccountKey};

const DEFAULT_KEY_FILE: &str = "service_account.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("No service account: set GOOGLE_SERVICE_ACCOUNT or GOOGLE_SERVICE_ACCOUNT_FILE")]
    MissingCredentials,

    #[error(transparent)]
    Credentials(#[from] KeyError),
}

#[derive(Debug, Clone)]
pub enum StoreBackend {
    Sheets {
        sheet_key: String,
        range: String,
        key: ServiceAccountKey,
    },
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub backend: StoreBackend,

    pub timezone: Tz,
    pub cache_ttl: Duration,
    pub refresh_interval: Duration,

    pub submit_rate_limit: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), Path::new(DEFAULT_KEY_FILE))
    }

    /// Build from an arbitrary variable source; `from_env` passes the
    /// process environment. `default_key_file` is tried when neither
    /// credential variable is set.
    pub fn from_lookup<F>(lookup: F, default_key_file: &Path) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match var("STORE_BACKEND").as_deref().unwrap_or("sheets") {
            "sheets" => {
                let sheet_key = var("SHEET_KEY").ok_or(ConfigError::Missing("SHEET_KEY"))?;
                let key = match (var("GOOGLE_SERVICE_ACCOUNT"), var("GOOGLE_SERVICE_ACCOUNT_FILE")) {
                    (Some(blob), _) => ServiceAccountKey::from_json(&blob)?,
                    (None, Some(path)) => ServiceAccountKey::from_file(Path::new(&path))?,
                    (None, None) => {
                        if !default_key_file.exists() {
                            return Err(ConfigError::MissingCredentials);
                        }
                        ServiceAccountKey::from_file(default_key_file)?
                    }
                };
                StoreBackend::Sheets {
                    sheet_key,
                    range: var("SHEET_RANGE").unwrap_or_else(|| "A:C".into()),
                    key,
                }
            }
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    name: "STORE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        let refresh_interval: u64 = parse_or(&var, "REFRESH_INTERVAL_SECS", 9)?;
        if refresh_interval == 0 {
            return Err(ConfigError::Invalid {
                name: "REFRESH_INTERVAL_SECS",
                value: "0".into(),
            });
        }

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&var, "PORT", 8080)?,
            backend,
            timezone: parse_or(&var, "DASHBOARD_TZ", chrono_tz::America::New_York)?,
            cache_ttl: Duration::from_secs(parse_or(&var, "CACHE_TTL_SECS", 60)?),
            refresh_interval: Duration::from_secs(refresh_interval),
            submit_rate_limit: parse_or(&var, "SUBMIT_RATE_LIMIT", 30)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, V>(var: &V, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
