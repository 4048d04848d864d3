//! Common types module for the storefront order lifecycle service.
//!
//! This module defines the core data types shared by every storefront crate:
//! the order snapshot, the customer-facing progress and timeline projections,
//! staff work-queue pages, and the API error surface. Keeping them in one
//! place lets storage, core and service agree on a single wire shape.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Order snapshot types: status, payment method, line items and summaries.
pub mod order;
/// Customer-facing progress stages and timeline events.
pub mod progress;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage types for managing persistent data.
pub mod storage;
/// Utility functions for display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;
/// Staff work-queue pages, counts and revenue summaries.
pub mod work;

// Re-export all types for convenient access
pub use api::*;
pub use order::*;
pub use progress::*;
pub use registry::ImplementationRegistry;
pub use storage::*;
pub use utils::truncate_id;
pub use validation::*;
pub use work::*;
