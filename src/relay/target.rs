//! Outbound target parsing.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Scheme given to a target written as a bare host.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while parsing a target.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("target cannot be empty")]
    Empty,

    #[error("'{target}' is not a valid URL: {reason}")]
    InvalidUrl { target: String, reason: String },

    #[error("'{target}' uses unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { target: String, scheme: String },
}

/// The external address being health-checked.
///
/// Keeps the string as configured for diagnostics next to the URL actually requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    raw: String,
    url: Url,
}

impl Target {
    /// Parse a URL or bare host, prefixing `scheme` when none is present.
    pub fn parse(raw: &str, scheme: Scheme) -> Result<Self, TargetError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TargetError::Empty);
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("{}://{}", scheme, raw)
        };

        let url = Url::parse(&candidate).map_err(|e| TargetError::InvalidUrl {
            target: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TargetError::UnsupportedScheme {
                    target: raw.to_string(),
                    scheme: other.to_string(),
                });
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// The target as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The URL requested on each check.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
