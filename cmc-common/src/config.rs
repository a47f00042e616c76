//! Configuration file discovery and loading
//!
//! Config file resolution priority order:
//! 1. Explicit path (command-line argument, highest priority)
//! 2. Environment variable
//! 3. Platform config directory (`~/.config/cmc/config.toml` on Linux)
//! 4. System-wide file (`/etc/cmc/config.toml`, Linux only)
//!
//! When no file is found, callers fall back to compiled defaults.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CMC_CONFIG";

/// Locate the config file to use, if any
///
/// An explicit path (argument or environment variable) is returned even if
/// it does not exist, so that loading reports the missing file instead of
/// silently using defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: Platform locations
    default_config_locations().into_iter().find(|p| p.exists())
}

/// Candidate config files for the platform, in priority order
fn default_config_locations() -> Vec<PathBuf> {
    let mut locations: Vec<PathBuf> = dirs::config_dir()
        .map(|d| d.join("cmc").join("config.toml"))
        .into_iter()
        .collect();

    if cfg!(target_os = "linux") {
        locations.push(PathBuf::from("/etc/cmc/config.toml"));
    }
    locations
}

/// Parse a TOML config file
pub fn load_config_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Resolve and load a config file, or return `T::default()` when none exists
pub fn load_config<T: DeserializeOwned + Default>(
    cli_arg: Option<&Path>,
    env_var_name: &str,
) -> Result<T> {
    match resolve_config_path(cli_arg, env_var_name) {
        Some(path) => load_config_file(&path),
        None => {
            debug!("No config file found, using compiled defaults");
            Ok(T::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        port: u16,
        name: String,
    }

    #[test]
    #[serial]
    fn test_cli_arg_wins_over_env() {
        std::env::set_var("CMC_TEST_CONFIG_A", "/from/env.toml");
        let path = resolve_config_path(Some(Path::new("/from/cli.toml")), "CMC_TEST_CONFIG_A");
        assert_eq!(path, Some(PathBuf::from("/from/cli.toml")));
        std::env::remove_var("CMC_TEST_CONFIG_A");
    }

    #[test]
    #[serial]
    fn test_env_var_used_without_cli_arg() {
        std::env::set_var("CMC_TEST_CONFIG_B", "/from/env.toml");
        let path = resolve_config_path(None, "CMC_TEST_CONFIG_B");
        assert_eq!(path, Some(PathBuf::from("/from/env.toml")));
        std::env::remove_var("CMC_TEST_CONFIG_B");
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 5790\nname = \"canvas\"").unwrap();

        let sample: Sample = load_config_file(file.path()).unwrap();
        assert_eq!(sample, Sample { port: 5790, name: "canvas".to_string() });
    }

    #[test]
    fn test_partial_file_uses_field_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 1").unwrap();

        let sample: Sample = load_config_file(file.path()).unwrap();
        assert_eq!(sample.port, 1);
        assert_eq!(sample.name, "");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result: Result<Sample> =
            load_config(Some(Path::new("/nonexistent/cmc/config.toml")), "CMC_TEST_UNSET");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = [not toml").unwrap();

        let result: Result<Sample> = load_config_file(file.path());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
