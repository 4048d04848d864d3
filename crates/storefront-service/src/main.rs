//! Main entry point for the storefront order service.
//!
//! Loads configuration, wires the configured storage backend into an
//! [`OrderEngine`] and serves the order HTTP API.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use storefront_config::Config;
use storefront_core::{EngineBuilder, EngineFactories, OrderEngine};

mod apis;
mod server;

/// Command-line arguments for the storefront service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "STOREFRONT_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(args.log_level.clone()));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started storefront");

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, engine) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown signal received");
				}
			}
		},
		None => {
			tracing::warn!("API disabled in configuration, nothing to serve");
		},
	}

	tracing::info!("Stopped storefront");
	Ok(())
}

/// Builds the order engine with every storage backend the storage crate registers.
fn build_engine(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let storage_factories = storefront_storage::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect();

	Ok(EngineBuilder::new(config).build(EngineFactories { storage_factories })?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::parse_from(["storefront"]);
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["storefront", "-c", "custom.toml", "--log-level", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[test]
	fn test_build_engine_accepts_every_registered_backend() {
		let config: Config = r#"
[service]
id = "main-test"

[storage]
primary = "memory"
[storage.implementations.memory]
[storage.implementations.file]
storage_path = "./target/test-orders"
"#
		.parse()
		.unwrap();

		assert!(build_engine(config).is_ok());
	}

	#[test]
	fn test_build_engine_with_memory_storage() {
		let config: Config = r#"
[service]
id = "main-test"

[storage]
primary = "memory"
[storage.implementations.memory]
"#
		.parse()
		.unwrap();

		assert!(build_engine(config).is_ok());
	}

	#[tokio::test]
	async fn test_build_engine_from_file_config() {
		let dir = tempdir().unwrap();
		let data_dir = dir.path().join("orders");
		let config_path = dir.path().join("storefront.toml");
		std::fs::write(
			&config_path,
			format!(
				r#"
[service]
id = "file-test"
utc_offset_minutes = 420

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "{}"
"#,
				data_dir.display()
			),
		)
		.unwrap();

		let config = Config::from_file(config_path.to_str().unwrap())
			.await
			.unwrap();
		let engine = build_engine(config).unwrap();
		let counts = engine.counts(None).await.unwrap();
		assert_eq!(counts.preparing, 0);
	}

	#[test]
	fn test_unknown_storage_backend_fails() {
		let config: Config = r#"
[service]
id = "main-test"

[storage]
primary = "postgres"
[storage.implementations.postgres]
"#
		.parse()
		.unwrap();

		assert!(build_engine(config).is_err());
	}
}
