// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./safespace.toml` > `~/.config/safespace/safespace.toml` >
//! `/etc/safespace/safespace.toml`, with `SAFESPACE_*` environment overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SafeSpaceConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/safespace/safespace.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "safespace.toml";

/// Config sections that environment variables may target.
const ENV_SECTIONS: &[&str] = &["server", "openai", "memory", "cache", "persona"];

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("safespace").join(LOCAL_CONFIG_FILE))
}

/// Build the layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/safespace/safespace.toml`
/// 3. `~/.config/safespace/safespace.toml`
/// 4. `./safespace.toml`
/// 5. `SAFESPACE_*` environment variables
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(SafeSpaceConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<SafeSpaceConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults (no env, no files).
pub fn load_config_from_str(toml_content: &str) -> Result<SafeSpaceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SafeSpaceConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<SafeSpaceConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SafeSpaceConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment provider mapping `SAFESPACE_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `SAFESPACE_OPENAI_API_KEY` maps to `openai.api_key` and
/// `SAFESPACE_MEMORY_MAX_TURNS` to `memory.max_turns`.
fn env_provider() -> Env {
    Env::prefixed("SAFESPACE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key
}
