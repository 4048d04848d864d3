//! File-based storage backend.
//!
//! Each key is one JSON file under `storage_path`. Writes go to a temporary
//! file first and are renamed into place, so readers never observe a partial
//! value. Mutations inside one store are serialized by an async mutex, which
//! is what makes compare-and-swap atomic for this backend; two processes
//! pointing at the same directory are not supported.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use storefront_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use tokio::fs;
use tokio::sync::Mutex;

const DEFAULT_STORAGE_PATH: &str = "./data/storage";
const EXTENSION: &str = "json";

/// File-based storage implementation.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes writers within this process.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key to a file path.
	///
	/// Anything outside `[A-Za-z0-9_-]` is escaped as `%XX` so that the key
	/// can be recovered from the file name when listing.
	fn get_file_path(&self, key: &str) -> PathBuf {
		self.base_path
			.join(format!("{}.{}", encode_key(key), EXTENSION))
	}

	async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes atomically by writing to a temp file then renaming.
	async fn write_file(&self, path: &Path, value: &[u8]) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

fn encode_key(key: &str) -> String {
	let mut encoded = String::with_capacity(key.len());
	for byte in key.bytes() {
		if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
			encoded.push(byte as char);
		} else {
			encoded.push_str(&format!("%{:02X}", byte));
		}
	}
	encoded
}

fn decode_key(encoded: &str) -> Option<String> {
	let bytes = encoded.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' {
			let hex = encoded.get(i + 1..i + 3)?;
			decoded.push(u8::from_str_radix(hex, 16).ok()?);
			i += 3;
		} else {
			decoded.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(decoded).ok()
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		Self::read_optional(&self.get_file_path(key))
			.await?
			.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;
		self.write_file(&path, &value).await
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: &[u8],
		new: Vec<u8>,
	) -> Result<bool, StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		let current = Self::read_optional(&path)
			.await?
			.ok_or(StorageError::NotFound)?;
		if current != expected {
			return Ok(false);
		}

		self.write_file(&path, &new).await?;
		Ok(true)
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);
		let _guard = self.write_lock.lock().await;

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
				continue;
			};
			match decode_key(stem) {
				Some(key) if key.starts_with(prefix) => keys.push(key),
				Some(_) => {},
				None => {
					tracing::debug!("Skipping file {:?}: name is not an encoded key", path);
				},
			}
		}

		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if path.trim().is_empty() => {
							Err("storage_path cannot be empty".to_string())
						},
						_ => Ok(()),
					}
				}),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for order files (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_STORAGE_PATH);

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use tempfile::TempDir;

	fn storage(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().to_path_buf())
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let temp_dir = TempDir::new().unwrap();
		let storage = storage(&temp_dir);

		let key = "orders:0b6f";
		storage.set_bytes(key, b"{}".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"{}".to_vec());

		storage.delete(key).await.unwrap();
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
		// Deleting twice is fine.
		storage.delete(key).await.unwrap();
	}

	#[tokio::test]
	async fn test_values_survive_reopen() {
		let temp_dir = TempDir::new().unwrap();
		storage(&temp_dir)
			.set_bytes("orders:a", b"persisted".to_vec())
			.await
			.unwrap();

		let reopened = storage(&temp_dir);
		assert_eq!(
			reopened.get_bytes("orders:a").await.unwrap(),
			b"persisted".to_vec()
		);
	}

	#[tokio::test]
	async fn test_keys_round_trip_through_file_names() {
		let temp_dir = TempDir::new().unwrap();
		let storage = storage(&temp_dir);
		storage.set_bytes("orders:a/b c", vec![1]).await.unwrap();
		storage.set_bytes("orders:plain", vec![2]).await.unwrap();
		storage.set_bytes("carts:x", vec![3]).await.unwrap();
		std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

		let mut keys = storage.keys("orders:").await.unwrap();
		keys.sort();
		assert_eq!(
			keys,
			vec!["orders:a/b c".to_string(), "orders:plain".to_string()]
		);
	}

	#[tokio::test]
	async fn test_keys_on_missing_directory() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().join("not-yet-created"));
		assert!(storage.keys("orders:").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_concurrent_compare_and_swap_has_one_winner() {
		let temp_dir = TempDir::new().unwrap();
		let storage = Arc::new(storage(&temp_dir));
		storage.set_bytes("orders:1", b"v0".to_vec()).await.unwrap();

		let mut handles = Vec::new();
		for i in 0..8u8 {
			let storage = Arc::clone(&storage);
			handles.push(tokio::spawn(async move {
				storage
					.compare_and_swap("orders:1", b"v0", vec![b'w', b'0' + i])
					.await
					.unwrap()
			}));
		}

		let mut winners = 0;
		for handle in handles {
			if handle.await.unwrap() {
				winners += 1;
			}
		}
		assert_eq!(winners, 1);
	}

	#[test]
	fn test_schema_validation() {
		let valid: toml::Value = toml::from_str("storage_path = \"./orders\"").unwrap();
		assert!(FileStorageSchema.validate(&valid).is_ok());

		let blank: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(FileStorageSchema.validate(&blank).is_err());

		let typo: toml::Value = toml::from_str("storage_pth = \"./orders\"").unwrap();
		assert!(matches!(
			FileStorageSchema.validate(&typo),
			Err(ValidationError::UnknownField(_))
		));
	}

	#[test]
	fn test_key_encoding() {
		assert_eq!(encode_key("orders:ab-1"), "orders%3Aab-1");
		assert_eq!(decode_key("orders%3Aab-1").as_deref(), Some("orders:ab-1"));
		assert_eq!(decode_key("bad%Z"), None);
	}
}
