use std::{env, time::Duration};

pub const DEFAULT_LISTEN_ADDR: &str = "localhost:8080";
pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:11434/";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(300);

pub const GENERATE_ENDPOINT: &str = "api/generate";

/// How failures inside the relay pipeline reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    /// Log the failure and answer `200 OK` with an empty body.
    #[default]
    Compat,
    /// Stop at the first failing step and answer with its error status.
    Strict,
}

impl std::str::FromStr for FailureMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compat" => Ok(FailureMode::Compat),
            "strict" => Ok(FailureMode::Strict),
            _ => Err(ConfigError::Invalid {
                key: "FAILURE_MODE",
                value: value.into(),
                reason: "expected 'compat' or 'strict'",
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: Box<str>,
        reason: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: Box<str>,
    pub upstream_url: Box<str>,
    pub model: Box<str>,
    pub max_body_bytes: usize,
    pub upstream_timeout: Duration,
    pub failure_mode: FailureMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.into(),
            upstream_url: DEFAULT_UPSTREAM_URL.into(),
            model: DEFAULT_MODEL.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            failure_mode: FailureMode::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to the
    /// defaults for every missing key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let listen_addr = lookup("LISTEN_ADDR")
            .map(String::into_boxed_str)
            .unwrap_or(defaults.listen_addr);

        let upstream_url = match lookup("UPSTREAM_URL") {
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        key: "UPSTREAM_URL",
                        value: url.into(),
                        reason: "must be an http:// or https:// URL",
                    });
                }
                url.into_boxed_str()
            },
            None => defaults.upstream_url,
        };

        // An empty MODEL is allowed: the field is then left out of the request.
        let model = lookup("MODEL")
            .map(String::into_boxed_str)
            .unwrap_or(defaults.model);

        let max_body_bytes = match lookup("MAX_BODY_BYTES") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "MAX_BODY_BYTES",
                value: value.into(),
                reason: "must be a non-negative integer",
            })?,
            None => defaults.max_body_bytes,
        };

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "UPSTREAM_TIMEOUT_SECS",
                        value: value.into(),
                        reason: "must be a positive number of seconds",
                    });
                },
            },
            None => defaults.upstream_timeout,
        };

        let failure_mode = match lookup("FAILURE_MODE") {
            Some(value) => value.parse()?,
            None => defaults.failure_mode,
        };

        Ok(Self {
            listen_addr,
            upstream_url,
            model,
            max_body_bytes,
            upstream_timeout,
            failure_mode,
        })
    }

    pub fn generate_url(&self) -> String {
        format!("{}/{}", self.upstream_url.trim_end_matches('/'), GENERATE_ENDPOINT)
    }
}
