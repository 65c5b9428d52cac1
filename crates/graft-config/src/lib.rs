//! Configuration management for graft
//!
//! Configuration is layered with figment: built-in defaults, then
//! `graft.toml` (or `.graft/config.toml`), then an optional
//! `[environments.<GRAFT_ENV>]` profile, then `GRAFT__*` environment
//! variables.

pub mod logging;

use graft_foundation::{GraftError, GraftResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Patch engine behaviour
    #[serde(default)]
    pub patching: PatchingConfig,
    /// Class synthesis behaviour
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

/// Log output format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format for development
    #[default]
    Pretty,
    /// Structured JSON format for tooling
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

/// Patch engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchingConfig {
    /// Upper bound on alias candidates tried before giving up on a file
    pub max_alias_attempts: usize,
    /// Width of one indent level when a file gives no hint of its own
    pub indent_width: usize,
    /// Print patched files instead of writing them
    pub dry_run: bool,
}

/// Class synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisConfig {
    /// Prefix used to alias a base class whose short name collides with the
    /// generated class
    pub base_alias_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl Default for PatchingConfig {
    fn default() -> Self {
        Self {
            max_alias_attempts: 32,
            indent_width: 4,
            dry_run: false,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_alias_prefix: "Base".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from config files and the environment
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables (`GRAFT__*`, `__` separates nesting levels)
    /// 2. Environment-specific profile from `graft.toml` (based on `GRAFT_ENV`)
    /// 3. Base configuration from `graft.toml` or `.graft/config.toml`
    /// 4. Default values
    pub fn load() -> GraftResult<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`AppConfig::load`], resolving config files against `root`
    pub fn load_from(root: &Path) -> GraftResult<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Toml},
            Figment,
        };

        let env_profile = std::env::var("GRAFT_ENV").unwrap_or_else(|_| "default".to_string());

        tracing::debug!(profile = %env_profile, "Loading configuration with profile");

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

        let toml_paths = ["graft.toml", ".graft/config.toml"];
        for toml_path in &toml_paths {
            let path = root.join(toml_path);
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading TOML configuration");
                figment = figment.merge(Toml::file(&path));
                if env_profile != "default" {
                    tracing::debug!(profile = %env_profile, "Applying environment-specific profile");
                    // Overrides live under [environments.<profile>] in the same file
                    figment = figment.merge(
                        Figment::from(Toml::file(&path))
                            .focus(&format!("environments.{}", env_profile)),
                    );
                }
                break;
            }
        }

        // Env lowercases keys by default, which would erase the camelCase path
        let figment = figment.merge(
            Env::prefixed("GRAFT__")
                .map(|k| env_key_path(k.as_str()).into())
                .lowercase(false),
        );

        let config: AppConfig = figment
            .extract()
            .map_err(|e| GraftError::config(format!("Failed to load configuration: {}", e)))?;

        config.validate()?;

        tracing::debug!(
            level = %config.logging.level,
            max_alias_attempts = config.patching.max_alias_attempts,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> GraftResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(GraftError::config(format!(
                "Invalid log level '{}', must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        if self.patching.max_alias_attempts == 0 {
            return Err(GraftError::config(
                "patching.maxAliasAttempts must be at least 1",
            ));
        }

        if self.patching.indent_width == 0 || self.patching.indent_width > 16 {
            return Err(GraftError::config(format!(
                "patching.indentWidth must be between 1 and 16, got {}",
                self.patching.indent_width
            )));
        }

        if !is_identifier(&self.synthesis.base_alias_prefix) {
            return Err(GraftError::config(format!(
                "synthesis.baseAliasPrefix '{}' is not a valid class name prefix",
                self.synthesis.base_alias_prefix
            )));
        }

        Ok(())
    }
}

/// `PATCHING__MAX_ALIAS_ATTEMPTS` -> `patching.maxAliasAttempts`
fn env_key_path(key: &str) -> String {
    key.to_lowercase()
        .split("__")
        .map(|segment| {
            let mut parts = segment.split('_');
            let mut out = parts.next().unwrap_or_default().to_string();
            for part in parts {
                let mut chars = part.chars();
                if let Some(first) = chars.next() {
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.patching.max_alias_attempts, 32);
        assert_eq!(config.synthesis.base_alias_prefix, "Base");
    }

    #[test]
    fn test_validate_rejects_bad_level() {
        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid log level 'loud'"));
    }

    #[test]
    fn test_env_key_path() {
        assert_eq!(env_key_path("PATCHING__MAX_ALIAS_ATTEMPTS"), "patching.maxAliasAttempts");
        assert_eq!(env_key_path("logging__level"), "logging.level");
    }

    #[test]
    fn test_validate_rejects_zero_alias_attempts() {
        let mut config = AppConfig::default();
        config.patching.max_alias_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_prefix() {
        let mut config = AppConfig::default();
        config.synthesis.base_alias_prefix = "1Base".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "graft.toml",
                r#"
                [logging]
                level = "debug"

                [patching]
                maxAliasAttempts = 8
                "#,
            )?;
            jail.set_env("GRAFT__LOGGING__LEVEL", "error");
            jail.set_env("GRAFT__PATCHING__INDENT_WIDTH", "2");

            let config = AppConfig::load_from(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(config.logging.level, "error");
            assert_eq!(config.patching.max_alias_attempts, 8);
            assert_eq!(config.patching.indent_width, 2);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_multi_word_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRAFT__PATCHING__MAX_ALIAS_ATTEMPTS", "5");
            jail.set_env("GRAFT__PATCHING__DRY_RUN", "true");
            jail.set_env("GRAFT__SYNTHESIS__BASE_ALIAS_PREFIX", "Parent");

            let config = AppConfig::load_from(jail.directory()).map_err(|e| e.to_string())?;
            assert_eq!(config.patching.max_alias_attempts, 5);
            assert!(config.patching.dry_run);
            assert_eq!(config.synthesis.base_alias_prefix, "Parent");
            Ok(())
        });
    }

    #[test]
    fn test_load_applies_environment_profile() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "graft.toml",
                r#"
                [patching]
                indentWidth = 2

                [environments.ci.patching]
                dryRun = true
                "#,
            )?;
            jail.set_env("GRAFT_ENV", "ci");

            let config = AppConfig::load_from(jail.directory()).map_err(|e| e.to_string())?;
            assert!(config.patching.dry_run);
            assert_eq!(config.patching.indent_width, 2);
            Ok(())
        });
    }
}
