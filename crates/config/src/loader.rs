//! Configuration loading utilities

use crate::{ConfigValidationError, Settings};
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use thiserror::Error;

/// Default configuration file, resolved relative to the working directory
const DEFAULT_CONFIG_FILE: &str = "config/config";

/// Prefix of environment overrides, e.g. `MHC__COLLECTION__MAX_RETRIES=5`
const ENV_PREFIX: &str = "MHC";

#[derive(Error, Debug)]
pub enum ConfigLoadError {
	#[error("Failed to read configuration: {0}")]
	Config(#[from] ConfigError),

	#[error("Invalid configuration: {0}")]
	Validation(#[from] ConfigValidationError),
}

/// Load configuration from the optional default file plus environment overrides
pub fn load_config() -> Result<Settings, ConfigLoadError> {
	let s = Config::builder()
		.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
		.add_source(env_source())
		.build()?;

	finish(s)
}

/// Load configuration from an explicit file plus environment overrides
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigLoadError> {
	let s = Config::builder()
		.add_source(File::from(path).required(true))
		.add_source(env_source())
		.build()?;

	finish(s)
}

fn env_source() -> Environment {
	Environment::with_prefix(ENV_PREFIX)
		.separator("__")
		.try_parsing(true)
}

fn finish(config: Config) -> Result<Settings, ConfigLoadError> {
	let settings: Settings = config.try_deserialize()?;
	settings.validate()?;
	Ok(settings)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_partial_file_keeps_defaults() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(
			file,
			"[collection]\nmax_concurrency = 4\n\n[analysis]\nrecommended_version = \"3.9\"\n"
		)
		.unwrap();

		let settings = load_config_from(file.path()).unwrap();
		assert_eq!(settings.collection.max_concurrency, 4);
		assert_eq!(settings.collection.max_retries, 3);
		assert_eq!(settings.analysis.recommended_version, "3.9");
		assert_eq!(settings.analysis.suppression.min_network_mb_per_sec, 10.0);
	}

	#[test]
	fn test_invalid_file_values_rejected() {
		let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
		writeln!(file, "[collection]\nmax_retries = 0\n").unwrap();

		let err = load_config_from(file.path()).unwrap_err();
		assert!(matches!(err, ConfigLoadError::Validation(_)));
	}

	#[test]
	fn test_missing_explicit_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let err = load_config_from(&dir.path().join("absent.toml")).unwrap_err();
		assert!(matches!(err, ConfigLoadError::Config(_)));
	}
}
