// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the SafeSpace gateway.
//!
//! TOML files merged with environment overrides via Figment, strict key
//! checking (`deny_unknown_fields`), semantic validation, and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! use safespace_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("listening on port {}", config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::SafeSpaceConfig;

/// Load configuration from the standard hierarchy and validate it.
pub fn load_and_validate() -> Result<SafeSpaceConfig, Vec<ConfigError>> {
    finish(loader::load_config())
}

/// Load configuration from an explicit file (plus env) and validate it.
pub fn load_and_validate_path(
    path: &std::path::Path,
) -> Result<SafeSpaceConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path))
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SafeSpaceConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content))
}

#[allow(clippy::result_large_err)]
fn finish(
    loaded: Result<SafeSpaceConfig, figment::Error>,
) -> Result<SafeSpaceConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}
