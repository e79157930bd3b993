// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup; any invalid value aborts startup before a request is
//! served.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `APP_ENV` | Deployment environment (`local`, `dev`, `prod`) | `local` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8082` |
//! | `APP_SECRET` | HMAC secret for bearer token verification | Required |
//! | `DATABASE_PATH` | redb file backing the link store | `./data/links.redb` |
//! | `STORE_TIMEOUT_SECS` | Upper bound for a single store operation | `4` |
//! | `SSO_ADDR` | Base URL of the identity authority | `http://localhost:44044` |
//! | `SSO_TIMEOUT_SECS` | Per-attempt timeout for authority calls (at most 300) | `5` |
//! | `SSO_RETRIES` | Retry budget for authority calls (at most 10) | `3` |
//! | `ALIAS_LENGTH` | Length of generated aliases | `6` |
//! | `ALIAS_MAX_ATTEMPTS` | Regeneration attempts on alias collision | `5` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | Derived from `APP_ENV` |
//! | `RUST_LOG` | Log level filter | Derived from `APP_ENV` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

pub const APP_ENV_ENV: &str = "APP_ENV";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const APP_SECRET_ENV: &str = "APP_SECRET";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const STORE_TIMEOUT_ENV: &str = "STORE_TIMEOUT_SECS";
pub const SSO_ADDR_ENV: &str = "SSO_ADDR";
pub const SSO_TIMEOUT_ENV: &str = "SSO_TIMEOUT_SECS";
pub const SSO_RETRIES_ENV: &str = "SSO_RETRIES";
pub const ALIAS_LENGTH_ENV: &str = "ALIAS_LENGTH";
pub const ALIAS_MAX_ATTEMPTS_ENV: &str = "ALIAS_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8082;
const DEFAULT_DATABASE_PATH: &str = "./data/links.redb";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 4;
const DEFAULT_SSO_ADDR: &str = "http://localhost:44044";
const DEFAULT_SSO_TIMEOUT_SECS: u64 = 5;
const DEFAULT_SSO_RETRIES: u32 = 3;
const MAX_SSO_TIMEOUT_SECS: u64 = 300;
const MAX_SSO_RETRIES: u32 = 10;

/// Default length of generated aliases.
pub const DEFAULT_ALIAS_LENGTH: usize = 6;

/// Default number of insert attempts for generated aliases.
pub const DEFAULT_ALIAS_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Deployment environment. Drives logging defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Local,
    Dev,
    Prod,
}

impl AppEnv {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "local" => Some(AppEnv::Local),
            "dev" => Some(AppEnv::Dev),
            "prod" => Some(AppEnv::Prod),
            _ => None,
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is not set.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            AppEnv::Local | AppEnv::Dev => "debug,tower_http=debug,hyper=info",
            AppEnv::Prod => "info,tower_http=info",
        }
    }

    pub fn default_log_format(self) -> LogFormat {
        match self {
            AppEnv::Local => LogFormat::Pretty,
            AppEnv::Dev | AppEnv::Prod => LogFormat::Json,
        }
    }
}

impl std::fmt::Display for AppEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppEnv::Local => write!(f, "local"),
            AppEnv::Dev => write!(f, "dev"),
            AppEnv::Prod => write!(f, "prod"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Settings for the identity authority client.
#[derive(Debug, Clone)]
pub struct SsoConfig {
    pub addr: Url,
    pub timeout: Duration,
    pub retries: u32,
}

/// Alias generation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasPolicy {
    pub length: usize,
    pub max_attempts: u32,
}

impl Default for AliasPolicy {
    fn default() -> Self {
        Self {
            length: DEFAULT_ALIAS_LENGTH,
            max_attempts: DEFAULT_ALIAS_MAX_ATTEMPTS,
        }
    }
}

/// Fully validated runtime configuration.
#[derive(Clone)]
pub struct Config {
    pub env: AppEnv,
    pub bind_addr: SocketAddr,
    pub app_secret: String,
    pub database_path: PathBuf,
    pub store_timeout: Duration,
    pub sso: SsoConfig,
    pub alias: AliasPolicy,
    pub log_format: LogFormat,
}

// The secret must never end up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("app_secret", &"<redacted>")
            .field("database_path", &self.database_path)
            .field("store_timeout", &self.store_timeout)
            .field("sso", &self.sso)
            .field("alias", &self.alias)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let env = match var(APP_ENV_ENV) {
            Some(value) => AppEnv::parse(&value).ok_or_else(|| ConfigError::Invalid {
                var: APP_ENV_ENV,
                value,
                reason: "expected one of local, dev, prod".to_string(),
            })?,
            None => AppEnv::Local,
        };

        let host = var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip: IpAddr = host.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            var: HOST_ENV,
            value: host.clone(),
            reason: e.to_string(),
        })?;
        let port = parse_or(var(PORT_ENV), PORT_ENV, DEFAULT_PORT)?;

        let app_secret = var(APP_SECRET_ENV).ok_or(ConfigError::Missing(APP_SECRET_ENV))?;

        let database_path = var(DATABASE_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        let store_timeout = Duration::from_secs(non_zero(
            parse_or(var(STORE_TIMEOUT_ENV), STORE_TIMEOUT_ENV, DEFAULT_STORE_TIMEOUT_SECS)?,
            STORE_TIMEOUT_ENV,
        )?);

        let sso_addr_raw = var(SSO_ADDR_ENV).unwrap_or_else(|| DEFAULT_SSO_ADDR.to_string());
        let sso_addr = Url::parse(&sso_addr_raw).map_err(|e| ConfigError::Invalid {
            var: SSO_ADDR_ENV,
            value: sso_addr_raw.clone(),
            reason: e.to_string(),
        })?;
        let sso_timeout = Duration::from_secs(at_most(
            non_zero(
                parse_or(var(SSO_TIMEOUT_ENV), SSO_TIMEOUT_ENV, DEFAULT_SSO_TIMEOUT_SECS)?,
                SSO_TIMEOUT_ENV,
            )?,
            MAX_SSO_TIMEOUT_SECS,
            SSO_TIMEOUT_ENV,
        )?);
        let sso_retries = at_most(
            parse_or(var(SSO_RETRIES_ENV), SSO_RETRIES_ENV, DEFAULT_SSO_RETRIES)?,
            MAX_SSO_RETRIES,
            SSO_RETRIES_ENV,
        )?;

        let alias = AliasPolicy {
            length: non_zero(
                parse_or(var(ALIAS_LENGTH_ENV), ALIAS_LENGTH_ENV, DEFAULT_ALIAS_LENGTH)?,
                ALIAS_LENGTH_ENV,
            )?,
            max_attempts: non_zero(
                parse_or(
                    var(ALIAS_MAX_ATTEMPTS_ENV),
                    ALIAS_MAX_ATTEMPTS_ENV,
                    DEFAULT_ALIAS_MAX_ATTEMPTS,
                )?,
                ALIAS_MAX_ATTEMPTS_ENV,
            )?,
        };
        if alias.length > crate::alias::MAX_ALIAS_LEN {
            return Err(ConfigError::Invalid {
                var: ALIAS_LENGTH_ENV,
                value: alias.length.to_string(),
                reason: format!("must not exceed {}", crate::alias::MAX_ALIAS_LEN),
            });
        }

        let log_format = match var(LOG_FORMAT_ENV) {
            Some(value) => match value.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "pretty" => LogFormat::Pretty,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: LOG_FORMAT_ENV,
                        value,
                        reason: "expected json or pretty".to_string(),
                    })
                }
            },
            None => env.default_log_format(),
        };

        Ok(Self {
            env,
            bind_addr: SocketAddr::new(ip, port),
            app_secret,
            database_path,
            store_timeout,
            sso: SsoConfig {
                addr: sso_addr,
                timeout: sso_timeout,
                retries: sso_retries,
            },
            alias,
            log_format,
        })
    }
}

fn parse_or<T>(value: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn non_zero<T>(value: T, var: &'static str) -> Result<T, ConfigError>
where
    T: PartialEq + Default + ToString,
{
    if value == T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn at_most<T>(value: T, max: T, var: &'static str) -> Result<T, ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value > max {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: format!("must not exceed {max}"),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[(APP_SECRET_ENV, "s3cret")]).unwrap();
        assert_eq!(config.env, AppEnv::Local);
        assert_eq!(config.bind_addr, "0.0.0.0:8082".parse().unwrap());
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(config.store_timeout, Duration::from_secs(4));
        assert_eq!(config.sso.addr.as_str(), "http://localhost:44044/");
        assert_eq!(config.sso.timeout, Duration::from_secs(5));
        assert_eq!(config.sso.retries, 3);
        assert_eq!(config.alias, AliasPolicy::default());
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(APP_SECRET_ENV)));

        let err = load(&[(APP_SECRET_ENV, "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(APP_SECRET_ENV)));
    }

    #[test]
    fn prod_env_defaults_to_json_logs() {
        let config = load(&[(APP_SECRET_ENV, "x"), (APP_ENV_ENV, "prod")]).unwrap();
        assert_eq!(config.env, AppEnv::Prod);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.env.default_log_filter(), "info,tower_http=info");
    }

    #[test]
    fn log_format_override_wins() {
        let config = load(&[
            (APP_SECRET_ENV, "x"),
            (APP_ENV_ENV, "prod"),
            (LOG_FORMAT_ENV, "pretty"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (PORT_ENV, "eighty")]),
            Err(ConfigError::Invalid { var: PORT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (APP_ENV_ENV, "staging")]),
            Err(ConfigError::Invalid { var: APP_ENV_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (ALIAS_LENGTH_ENV, "0")]),
            Err(ConfigError::Invalid { var: ALIAS_LENGTH_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (ALIAS_LENGTH_ENV, "65")]),
            Err(ConfigError::Invalid { var: ALIAS_LENGTH_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (SSO_ADDR_ENV, "not a url")]),
            Err(ConfigError::Invalid { var: SSO_ADDR_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (HOST_ENV, "localhost:80")]),
            Err(ConfigError::Invalid { var: HOST_ENV, .. })
        ));
    }

    #[test]
    fn authority_settings_are_bounded() {
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (SSO_TIMEOUT_ENV, "18446744073709551615")]),
            Err(ConfigError::Invalid { var: SSO_TIMEOUT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (SSO_TIMEOUT_ENV, "301")]),
            Err(ConfigError::Invalid { var: SSO_TIMEOUT_ENV, .. })
        ));
        assert!(matches!(
            load(&[(APP_SECRET_ENV, "x"), (SSO_RETRIES_ENV, "4294967295")]),
            Err(ConfigError::Invalid { var: SSO_RETRIES_ENV, .. })
        ));

        let config = load(&[
            (APP_SECRET_ENV, "x"),
            (SSO_TIMEOUT_ENV, "300"),
            (SSO_RETRIES_ENV, "10"),
        ])
        .unwrap();
        assert_eq!(config.sso.timeout, Duration::from_secs(300));
        assert_eq!(config.sso.retries, 10);
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = load(&[(APP_SECRET_ENV, "top-secret-value")]).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("top-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
