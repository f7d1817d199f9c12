//! Builders to construct scheduler components from configuration.

pub mod driver_builder;

pub use driver_builder::{build_driver, build_pools};
