//! Builder for constructing order engines.
//!
//! Composes an [`OrderEngine`] from configuration and storage factory
//! functions. Every configured storage implementation is instantiated, so a
//! bad table for a backend that is not primary still fails startup.

use crate::clock::{Clock, SystemClock};
use crate::engine::OrderEngine;
use crate::work_queue::{LocalCalendar, PagingLimits};
use std::collections::HashMap;
use std::sync::Arc;
use storefront_config::Config;
use storefront_storage::{StorageError, StorageInterface, StorageService};
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions needed to build an [`OrderEngine`], keyed by the name
/// used under `[storage.implementations]`.
pub struct EngineFactories<SF> {
	pub storage_factories: HashMap<String, SF>,
}

/// Builder for constructing an OrderEngine with pluggable storage.
pub struct EngineBuilder {
	config: Config,
	clock: Arc<dyn Clock>,
}

impl EngineBuilder {
	/// Creates a new builder using the system clock.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			clock: Arc::new(SystemClock),
		}
	}

	/// Replaces the clock, mainly for tests.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Builds the OrderEngine using the given storage factories.
	pub fn build<SF>(self, factories: EngineFactories<SF>) -> Result<OrderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let mut storage_impls = HashMap::new();
		for (name, config) in &self.config.storage.implementations {
			let factory = factories.storage_factories.get(name).ok_or_else(|| {
				BuilderError::MissingComponent(format!("storage implementation '{}'", name))
			})?;

			match factory(config) {
				Ok(implementation) => {
					let is_primary = &self.config.storage.primary == name;
					tracing::info!(component = "storage", implementation = %name, enabled = %is_primary, "Loaded");
					storage_impls.insert(name.clone(), implementation);
				},
				Err(e) => {
					tracing::error!(
						component = "storage",
						implementation = %name,
						error = %e,
						"Failed to create storage implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create storage implementation '{}': {}",
						name, e
					)));
				},
			}
		}

		let primary_storage = &self.config.storage.primary;
		let storage_backend = storage_impls.remove(primary_storage).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' failed to load or has invalid configuration",
				primary_storage
			))
		})?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let calendar = LocalCalendar::from_offset_minutes(self.config.service.utc_offset_minutes)
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		let paging = PagingLimits {
			default_page_size: self.config.work_queue.default_page_size,
			max_page_size: self.config.work_queue.max_page_size,
		};

		tracing::info!(
			service_id = %self.config.service.id,
			utc_offset_minutes = self.config.service.utc_offset_minutes,
			"Order engine ready"
		);

		Ok(OrderEngine::new(storage, self.clock, calendar, paging))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_storage::StorageFactory;

	fn factories() -> EngineFactories<StorageFactory> {
		EngineFactories {
			storage_factories: storefront_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}

	#[test]
	fn test_builds_with_memory_storage() {
		let config: Config = r#"
[service]
id = "builder-test"
utc_offset_minutes = 420

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		assert!(EngineBuilder::new(config).build(factories()).is_ok());
	}

	#[test]
	fn test_invalid_secondary_backend_fails() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "memory"
[storage.implementations.memory]
[storage.implementations.file]
storage_pth = "./typo"
"#
		.parse()
		.unwrap();

		let err = EngineBuilder::new(config).build(factories()).err().unwrap();
		assert!(err.to_string().contains("'file'"));
	}

	#[test]
	fn test_unknown_backend_fails() {
		let config: Config = r#"
[service]
id = "builder-test"

[storage]
primary = "redis"
[storage.implementations.redis]
"#
		.parse()
		.unwrap();

		let err = EngineBuilder::new(config).build(factories()).err().unwrap();
		assert!(matches!(err, BuilderError::MissingComponent(_)));
	}
}
