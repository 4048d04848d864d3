//! Utility functions shared across the storefront crates.

pub mod formatting;

pub use formatting::truncate_id;
