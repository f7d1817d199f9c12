//! Unit tests for individual components, through the public API

mod builders_test;
mod config_test;
mod error_test;
mod loader_test;
mod report_test;
