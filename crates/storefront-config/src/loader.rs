//! Loading of a main configuration file and its section files.
//!
//! Deployments usually keep `[storage]` and `[api]` next to the main file so
//! they can differ per environment. The main file names them under `include`;
//! their sections are merged into the main table before deserialization.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

const INCLUDE_KEY: &str = "include";

/// Top-level sections a section file may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Section {
	Service,
	WorkQueue,
	Storage,
	Api,
}

impl Section {
	const ALL: [Section; 4] = [
		Section::Service,
		Section::WorkQueue,
		Section::Storage,
		Section::Api,
	];

	fn key(self) -> &'static str {
		match self {
			Section::Service => "service",
			Section::WorkQueue => "work_queue",
			Section::Storage => "storage",
			Section::Api => "api",
		}
	}

	fn from_key(key: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|section| section.key() == key)
	}
}

impl fmt::Display for Section {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "[{}]", self.key())
	}
}

/// One parsed file, with environment variables already substituted.
struct ConfigFile {
	path: PathBuf,
	table: toml::Table,
}

impl ConfigFile {
	async fn read(path: PathBuf) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("{}: {}", path.display(), e),
			))
		})?;
		let table: toml::Table = toml::from_str(&resolve_env_vars(&content)?)?;
		Ok(Self { path, table })
	}

	fn include_error(&self, reason: impl Into<String>) -> ConfigError {
		ConfigError::Include {
			file: self.path.clone(),
			reason: reason.into(),
		}
	}

	/// Removes the `include` entry and resolves it against this file's
	/// directory. Accepts a single string or an array of strings.
	fn take_includes(&mut self) -> Result<Vec<PathBuf>, ConfigError> {
		let base = self.path.parent().unwrap_or_else(|| Path::new("."));
		let names = match self.table.remove(INCLUDE_KEY) {
			None => return Ok(Vec::new()),
			Some(toml::Value::String(name)) => vec![name],
			Some(toml::Value::Array(items)) => items
				.into_iter()
				.map(|item| match item {
					toml::Value::String(name) => Ok(name),
					other => Err(self.include_error(format!(
						"include entries must be file names, found {}",
						other.type_str()
					))),
				})
				.collect::<Result<Vec<String>, ConfigError>>()?,
			Some(other) => {
				return Err(self.include_error(format!(
					"include must be a file name or a list of file names, found {}",
					other.type_str()
				)))
			},
		};
		Ok(names.into_iter().map(|name| base.join(name)).collect())
	}
}

/// Loads `path`, merges every file it includes, and validates the result.
pub(crate) async fn load(path: &Path) -> Result<Config, ConfigError> {
	let mut main = ConfigFile::read(path.to_path_buf()).await?;
	let includes = main.take_includes()?;
	if includes.is_empty() {
		return Config::from_table(main.table);
	}

	let main_identity = tokio::fs::canonicalize(&main.path).await?;
	let mut defined_in: HashMap<Section, PathBuf> = main
		.table
		.keys()
		.filter_map(|key| Section::from_key(key))
		.map(|section| (section, main.path.clone()))
		.collect();

	for include in includes {
		if tokio::fs::canonicalize(&include).await.ok().as_ref() == Some(&main_identity) {
			return Err(main.include_error("a configuration file cannot include itself"));
		}

		let file = ConfigFile::read(include).await?;
		for key in file.table.keys() {
			let Some(section) = Section::from_key(key) else {
				let reason = if key == INCLUDE_KEY {
					"section files cannot include other files".to_string()
				} else {
					format!(
						"unknown section '{}', expected one of: {}",
						key,
						Section::ALL.map(Section::key).join(", ")
					)
				};
				return Err(file.include_error(reason));
			};
			if let Some(previous) = defined_in.insert(section, file.path.clone()) {
				return Err(file.include_error(format!(
					"{} is already defined in {}",
					section,
					previous.display()
				)));
			}
		}
		main.table.extend(file.table);
	}

	Config::from_table(main.table)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const SERVICE: &str = "[service]\nid = \"storefront-main\"\n";
	const STORAGE: &str = "[storage]\nprimary = \"memory\"\n[storage.implementations.memory]\n";

	fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
		let path = dir.path().join(name);
		fs::write(&path, content).unwrap();
		path
	}

	fn include_reason(err: ConfigError) -> String {
		match err {
			ConfigError::Include { reason, .. } => reason,
			other => panic!("expected an include error, got {}", other),
		}
	}

	#[tokio::test]
	async fn test_single_file_config() {
		let dir = TempDir::new().unwrap();
		let path = write(
			&dir,
			"config.toml",
			&format!("{}utc_offset_minutes = -300\n{}", SERVICE, STORAGE),
		);

		let config = load(&path).await.unwrap();
		assert_eq!(config.service.id, "storefront-main");
		assert_eq!(config.service.utc_offset_minutes, -300);
	}

	#[tokio::test]
	async fn test_sections_merged_from_includes() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = [\"storage.toml\", \"api.toml\"]\n{}", SERVICE),
		);
		write(
			&dir,
			"storage.toml",
			"[storage]\nprimary = \"file\"\n[storage.implementations.file]\nstorage_path = \"./data/orders\"\n",
		);
		write(
			&dir,
			"api.toml",
			"[api]\nenabled = true\nport = 4000\n\n[work_queue]\ndefault_page_size = 25\n",
		);

		let config = load(&main).await.unwrap();
		assert_eq!(config.service.id, "storefront-main");
		assert_eq!(config.storage.primary, "file");
		assert_eq!(config.work_queue.default_page_size, 25);
		assert_eq!(config.api.map(|api| api.port), Some(4000));
	}

	#[tokio::test]
	async fn test_single_string_include() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = \"storage.toml\"\n{}", SERVICE),
		);
		write(&dir, "storage.toml", STORAGE);

		assert_eq!(load(&main).await.unwrap().storage.primary, "memory");
	}

	#[tokio::test]
	async fn test_section_defined_twice() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = [\"storage.toml\", \"more.toml\"]\n{}", SERVICE),
		);
		write(&dir, "storage.toml", STORAGE);
		write(&dir, "more.toml", "[service]\nid = \"storefront-other\"\n");

		let reason = include_reason(load(&main).await.unwrap_err());
		assert!(reason.contains("[service] is already defined in"), "{}", reason);
	}

	#[tokio::test]
	async fn test_unknown_section_in_include() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = [\"extra.toml\"]\n{}{}", SERVICE, STORAGE),
		);
		write(&dir, "extra.toml", "[payments]\ngateway = \"stripe\"\n");

		let reason = include_reason(load(&main).await.unwrap_err());
		assert!(reason.contains("unknown section 'payments'"), "{}", reason);
	}

	#[tokio::test]
	async fn test_nested_and_self_includes_rejected() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = [\"storage.toml\"]\n{}", SERVICE),
		);
		write(
			&dir,
			"storage.toml",
			&format!("include = [\"main.toml\"]\n{}", STORAGE),
		);
		let reason = include_reason(load(&main).await.unwrap_err());
		assert!(reason.contains("cannot include other files"), "{}", reason);

		let looped = write(
			&dir,
			"self.toml",
			&format!("include = [\"self.toml\"]\n{}", SERVICE),
		);
		let reason = include_reason(load(&looped).await.unwrap_err());
		assert!(reason.contains("cannot include itself"), "{}", reason);
	}

	#[tokio::test]
	async fn test_include_must_name_files() {
		let dir = TempDir::new().unwrap();
		let main = write(&dir, "main.toml", &format!("include = 3\n{}", SERVICE));
		assert!(matches!(
			load(&main).await,
			Err(ConfigError::Include { .. })
		));
	}

	#[tokio::test]
	async fn test_missing_include_reported() {
		let dir = TempDir::new().unwrap();
		let main = write(
			&dir,
			"main.toml",
			&format!("include = \"absent.toml\"\n{}", SERVICE),
		);

		match load(&main).await {
			Err(ConfigError::Io(e)) => assert!(e.to_string().contains("absent.toml")),
			other => panic!("expected an IO error, got {:?}", other.map(|_| ())),
		}
	}

	#[tokio::test]
	async fn test_from_file_resolves_includes_next_to_main_file() {
		let dir = TempDir::new().unwrap();
		let nested = dir.path().join("conf");
		fs::create_dir_all(&nested).unwrap();
		fs::write(
			nested.join("main.toml"),
			format!("include = [\"storage.toml\"]\n{}", SERVICE),
		)
		.unwrap();
		fs::write(nested.join("storage.toml"), STORAGE).unwrap();

		let path = nested.join("main.toml");
		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		assert_eq!(config.service.id, "storefront-main");
	}
}
