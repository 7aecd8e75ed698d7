//! Configuration data types.

use crate::relay::{ConnectionReuse, RelaySettings, Scheme, Target, TargetError};
use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings
    #[serde(default)]
    pub global: GlobalConfig,

    /// Relay listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound health check settings
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Global configuration settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Json,
            metrics: MetricsConfig::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Metrics endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Whether the metrics listener is started
    #[serde(default)]
    pub enabled: bool,

    /// Address to bind metrics server
    #[serde(default = "default_metrics_address")]
    pub address: SocketAddr,

    /// Path for metrics endpoint
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_metrics_address(),
            path: default_metrics_path(),
        }
    }
}

/// Relay listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Address and port to listen on
    #[serde(default = "default_listen_address")]
    pub listen: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen_address(),
        }
    }
}

/// Named bundle of relay defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RelayPreset {
    /// Plain HTTP, shared client, 503 on failure.
    #[default]
    Basic,
    /// HTTPS to a bare host with a longer timeout.
    Tls,
    /// New client per request with idle pooling disabled.
    NoKeepalive,
    /// Fetches and decodes a todo record from a JSON test endpoint.
    Json,
}

impl RelayPreset {
    /// Fallback target used when neither the environment nor the file names one.
    pub fn default_target(self) -> &'static str {
        match self {
            RelayPreset::Basic => "http://8.8.8.8",
            RelayPreset::Tls | RelayPreset::NoKeepalive => "8.8.8.8",
            RelayPreset::Json => "https://jsonplaceholder.typicode.com/todos/1",
        }
    }

    pub fn default_scheme(self) -> Scheme {
        match self {
            RelayPreset::Basic | RelayPreset::NoKeepalive => Scheme::Http,
            RelayPreset::Tls | RelayPreset::Json => Scheme::Https,
        }
    }

    pub fn default_timeout(self) -> Duration {
        match self {
            RelayPreset::Basic | RelayPreset::NoKeepalive => Duration::from_secs(5),
            RelayPreset::Tls | RelayPreset::Json => Duration::from_secs(10),
        }
    }

    pub fn default_connection_reuse(self) -> ConnectionReuse {
        match self {
            RelayPreset::NoKeepalive => ConnectionReuse::PerRequest,
            _ => ConnectionReuse::Shared,
        }
    }

    pub fn default_parse_payload(self) -> bool {
        self == RelayPreset::Json
    }

    pub fn default_failure_status(self) -> u16 {
        match self {
            RelayPreset::Basic | RelayPreset::Json => 503,
            RelayPreset::Tls | RelayPreset::NoKeepalive => 500,
        }
    }
}

/// Outbound health check configuration.
///
/// Every field except `preset` is optional and overrides the preset's value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RelayConfig {
    /// Preset supplying the defaults
    #[serde(default)]
    pub preset: RelayPreset,

    /// Target URL or bare host
    #[serde(default)]
    pub target: Option<String>,

    /// Scheme prepended to a bare host
    #[serde(default)]
    pub scheme: Option<Scheme>,

    /// Outbound request timeout
    #[serde(default, with = "option_humantime_serde")]
    pub timeout: Option<Duration>,

    /// Whether the outbound client is shared across requests
    #[serde(default)]
    pub connection_reuse: Option<ConnectionReuse>,

    /// Whether a 200 response body is decoded as a todo record
    #[serde(default)]
    pub parse_payload: Option<bool>,

    /// Status returned to the caller when the outbound call fails
    #[serde(default)]
    pub failure_status: Option<u16>,
}

impl RelayConfig {
    /// The target string after applying the preset fallback.
    pub fn effective_target(&self) -> &str {
        self.target
            .as_deref()
            .unwrap_or_else(|| self.preset.default_target())
    }

    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or_else(|| self.preset.default_timeout())
    }

    pub fn effective_failure_status(&self) -> u16 {
        self.failure_status
            .unwrap_or_else(|| self.preset.default_failure_status())
    }

    /// Resolve the preset and overrides into immutable relay settings.
    pub fn resolve(&self) -> Result<RelaySettings, TargetError> {
        let scheme = self.scheme.unwrap_or_else(|| self.preset.default_scheme());
        let target = Target::parse(self.effective_target(), scheme)?;
        let failure_status = StatusCode::from_u16(self.effective_failure_status())
            .unwrap_or(StatusCode::SERVICE_UNAVAILABLE);

        Ok(RelaySettings {
            target,
            timeout: self.effective_timeout(),
            connection_reuse: self
                .connection_reuse
                .unwrap_or_else(|| self.preset.default_connection_reuse()),
            parse_payload: self
                .parse_payload
                .unwrap_or_else(|| self.preset.default_parse_payload()),
            failure_status,
        })
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

fn default_metrics_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9090))
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

/// Custom serde module for optional humantime durations.
mod option_humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => {
                let s = humantime::format_duration(*d).to_string();
                serializer.serialize_some(&s)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<String> = Option::deserialize(deserializer)?;
        match opt {
            Some(s) => {
                let d = humantime::parse_duration(&s).map_err(serde::de::Error::custom)?;
                Ok(Some(d))
            }
            None => Ok(None),
        }
    }
}
