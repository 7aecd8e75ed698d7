//! Configuration validation.

use crate::config::Config;
use std::time::Duration;

/// Longest outbound timeout accepted.
const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Validate the configuration.
///
/// Checks for:
/// - A known log level
/// - A non-empty target that parses as an http/https URL
/// - A 5xx failure status
/// - A positive timeout no longer than five minutes
/// - Distinct listen and metrics addresses
///
/// # Returns
///
/// `Ok(())` if valid, or an error message describing the problem.
pub fn validate_config(config: &Config) -> Result<(), String> {
    let mut errors = Vec::new();
    let relay = &config.relay;

    if let Some(target) = &relay.target {
        if target.trim().is_empty() {
            errors.push("relay target cannot be empty".to_string());
        }
    }

    let failure_status = relay.effective_failure_status();
    if !(500..=599).contains(&failure_status) {
        errors.push(format!(
            "failure status {} is not a server error (must be 500-599)",
            failure_status
        ));
    }

    let timeout = relay.effective_timeout();
    if timeout.is_zero() {
        errors.push("relay timeout must be greater than zero".to_string());
    } else if timeout > MAX_TIMEOUT {
        errors.push(format!(
            "relay timeout {} exceeds the maximum of {}",
            humantime::format_duration(timeout),
            humantime::format_duration(MAX_TIMEOUT)
        ));
    }

    if errors.is_empty() {
        if let Err(e) = relay.resolve() {
            errors.push(format!("invalid relay target: {}", e));
        }
    }

    let metrics = &config.global.metrics;
    if metrics.enabled {
        if metrics.address == config.server.listen {
            errors.push(format!(
                "metrics address {} collides with the listen address",
                metrics.address
            ));
        }
        if !metrics.path.starts_with('/') {
            errors.push(format!("metrics path '{}' must start with '/'", metrics.path));
        }
    }

    // Validate log level
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.global.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "invalid log level '{}', must be one of: {}",
            config.global.log_level,
            valid_levels.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
