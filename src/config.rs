use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::EnergyFilter;

const APP_DIR: &str = "focusflow";
const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_TIME_BUDGET: u32 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config {}: {source}", .path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub data_dir: Option<PathBuf>,
	pub default_time_budget: u32,
	pub default_energy: EnergyFilter,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			data_dir: None,
			default_time_budget: DEFAULT_TIME_BUDGET,
			default_energy: EnergyFilter::Any,
		}
	}
}

pub fn resolve_config_path(cli_path: Option<PathBuf>) -> Option<PathBuf> {
	if let Some(path) = cli_path {
		return Some(absolutize(path));
	}

	if let Some(path) = non_empty_env("FOCUSFLOW_CONFIG") {
		return Some(absolutize(path));
	}

	config_home().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// A missing file means defaults; a present but broken one is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
	let Some(path) = path else {
		return Ok(Config::default());
	};

	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			debug!(path = %path.display(), "no config file, using defaults");
			return Ok(Config::default());
		}
		Err(err) => {
			return Err(ConfigError::Io {
				path: path.to_path_buf(),
				source: err,
			});
		}
	};

	parse_config(&raw).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})
}

pub fn parse_config(raw: &str) -> Result<Config, toml::de::Error> {
	toml::from_str(raw)
}

pub fn resolve_data_dir(cli_path: Option<PathBuf>, config: &Config) -> PathBuf {
	choose_data_dir(cli_path, non_empty_env("FOCUSFLOW_DATA_DIR"), config)
		.map(absolutize)
		.unwrap_or_else(default_data_dir)
}

fn choose_data_dir(
	cli_path: Option<PathBuf>,
	env_path: Option<PathBuf>,
	config: &Config,
) -> Option<PathBuf> {
	cli_path.or(env_path).or_else(|| config.data_dir.clone())
}

fn default_data_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR);
		}
	}

	if let Some(path) = non_empty_env("XDG_DATA_HOME") {
		return path.join(APP_DIR);
	}

	if let Some(path) = non_empty_env("HOME") {
		return path.join(".local").join("share").join(APP_DIR);
	}

	PathBuf::from(".focusflow")
}

fn config_home() -> Option<PathBuf> {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("APPDATA") {
			return Some(PathBuf::from(path));
		}
	}

	non_empty_env("XDG_CONFIG_HOME").or_else(|| non_empty_env("HOME").map(|home| home.join(".config")))
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
	env::var_os(name)
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
}

fn absolutize(path: PathBuf) -> PathBuf {
	if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	}
}
