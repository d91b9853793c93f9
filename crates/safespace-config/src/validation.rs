// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::SafeSpaceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &SafeSpaceConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level `{}` must be one of {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.openai.model.trim().is_empty() {
        fail("openai.model must not be empty".to_string());
    }

    if let Some(base) = &config.openai.api_base
        && !(base.starts_with("http://") || base.starts_with("https://"))
    {
        fail(format!("openai.api_base `{base}` must start with http:// or https://"));
    }

    for (name, value) in [
        ("openai.temperature", config.openai.temperature),
        ("openai.crisis_temperature", config.openai.crisis_temperature),
    ] {
        if !(0.0..=2.0).contains(&value) {
            fail(format!("{name} must be between 0.0 and 2.0, got {value}"));
        }
    }

    if config.openai.timeout_secs == 0 {
        fail("openai.timeout_secs must be at least 1".to_string());
    }

    if config.memory.max_turns == 0 {
        fail("memory.max_turns must be at least 1".to_string());
    }

    if config.cache.capacity == 0 {
        fail("cache.capacity must be at least 1".to_string());
    }

    if config.cache.ttl_secs == 0 {
        fail("cache.ttl_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
