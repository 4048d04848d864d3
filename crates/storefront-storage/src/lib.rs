//! Storage module for the storefront order service.
//!
//! This module provides abstractions for persisting order snapshots behind
//! pluggable backends (in-memory, file-based). Besides plain key-value
//! operations, every backend offers a byte-level compare-and-swap: the only
//! primitive the lifecycle needs to keep concurrent writers to one order
//! mutually exclusive without holding a lock across requests.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use storefront_types::{ConfigSchema, ImplementationRegistry};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// The stored value changed between read and write.
	#[error("Conflict: value for '{0}' changed since it was read")]
	Conflict(String),
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// Keys are `namespace:id` strings; values are opaque bytes.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, creating or overwriting the key.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Atomically replaces the value of `key` with `new` only if the current
	/// value is byte-for-byte equal to `expected`.
	///
	/// Returns `Ok(false)` when the current value differs, and
	/// `Err(StorageError::NotFound)` when the key does not exist.
	async fn compare_and_swap(
		&self,
		key: &str,
		expected: &[u8],
		new: Vec<u8>,
	) -> Result<bool, StorageError>;

	/// Deletes the value associated with the given key.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Lists every key starting with `prefix`, in no particular order.
	async fn keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples used by the engine builder.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Opaque proof of what a value looked like when it was read.
///
/// Handed back to [`StorageService::update_if_unchanged`] so the write only
/// commits if nobody else wrote in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(Vec<u8>);

/// High-level storage service that provides typed operations.
///
/// Wraps a low-level backend and serializes values as JSON.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value, creating or overwriting it.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let (value, _) = self.retrieve_with_revision(namespace, id).await?;
		Ok(value)
	}

	/// Retrieves a value together with the [`Revision`] it was read at.
	pub async fn retrieve_with_revision<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<(T, Revision), StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		let value =
			serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
		Ok((value, Revision(bytes)))
	}

	/// Writes `data` only if the stored value is still the one read at
	/// `revision`.
	///
	/// Fails with [`StorageError::Conflict`] when another writer committed
	/// first and with [`StorageError::NotFound`] when the value was removed.
	pub async fn update_if_unchanged<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		revision: &Revision,
		data: &T,
	) -> Result<Revision, StorageError> {
		let key = Self::key(namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;

		if self
			.backend
			.compare_and_swap(&key, &revision.0, bytes.clone())
			.await?
		{
			Ok(Revision(bytes))
		} else {
			Err(StorageError::Conflict(key))
		}
	}

	/// Retrieves every value stored under `namespace`.
	///
	/// Values removed between listing and reading are skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace);
		let mut values = Vec::new();

		for key in self.backend.keys(&prefix).await? {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => values.push(
					serde_json::from_slice(&bytes)
						.map_err(|e| StorageError::Serialization(e.to_string()))?,
				),
				Err(StorageError::NotFound) => {
					tracing::debug!(key = %key, "Skipping value removed during listing");
				},
				Err(e) => return Err(e),
			}
		}

		Ok(values)
	}

	/// Removes a value from storage.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}
}
