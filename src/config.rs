use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::error::QuizError;

/// Looked up in the working directory when no config path is given
pub const DEFAULT_CONFIG_FILE: &str = "quizmaster.toml";

#[derive(Deserialize, Clone, PartialEq, Debug)]
#[serde(default)]
pub struct QuizConfig {
	/// Directory searched (recursively) for quiz files
	pub quizzes_dir: PathBuf,

	// Without the leading dot
	pub extensions: Vec<String>,

	/// Default `tracing` filter directive, overridden by `RUST_LOG`
	pub log_level: String,
}

impl Default for QuizConfig {
	fn default() -> Self {
		Self {
			quizzes_dir: PathBuf::from("Quizzes"),
			extensions:  vec!["qz".to_string(), "txt".to_string()],
			log_level:   "info".to_string(),
		}
	}
}

impl QuizConfig {
	pub fn from_toml(content: &str) -> Result<Self, QuizError> { Ok(toml::from_str(content)?) }

	/// Loads the config at `path`, or `quizmaster.toml` if present. An explicit
	/// path must exist; the implicit one falls back to defaults.
	#[instrument]
	pub fn load(path: Option<&Path>) -> Result<Self, QuizError> {
		let (path, explicit) = match path {
			Some(path) => (path.to_path_buf(), true),
			None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
		};

		if !path.is_file() {
			if explicit {
				return Err(QuizError::ConfigNotFound(path));
			}
			debug!("No config at {:?}, using defaults", path);
			return Ok(Self::default());
		}

		let config = Self::from_toml(&fs_err::read_to_string(&path)?)?;
		info!("Loaded config from {:?}", path);
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_keys_use_defaults() {
		let config = QuizConfig::from_toml("quizzes_dir = \"decks\"").unwrap();
		assert_eq!(config.quizzes_dir, PathBuf::from("decks"));
		assert_eq!(config.extensions, vec!["qz", "txt"]);
		assert_eq!(config.log_level, "info");
	}

	#[test]
	fn reads_every_key() {
		let config =
			QuizConfig::from_toml("quizzes_dir = \"q\"\nextensions = [\"quiz\"]\nlog_level = \"debug\"").unwrap();
		assert_eq!(config, QuizConfig {
			quizzes_dir: PathBuf::from("q"),
			extensions:  vec!["quiz".to_string()],
			log_level:   "debug".to_string(),
		});
	}

	#[test]
	fn rejects_wrong_types() {
		assert!(matches!(QuizConfig::from_toml("extensions = \"qz\""), Err(QuizError::Config(_))));
	}

	#[test]
	fn explicit_missing_file_is_an_error() {
		let result = QuizConfig::load(Some(Path::new("definitely/not/here.toml")));
		assert!(matches!(result, Err(QuizError::ConfigNotFound(_))));
	}
}
