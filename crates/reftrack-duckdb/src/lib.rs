pub mod backend;
pub mod checkpoint;
pub mod events;
pub mod metrics;
pub mod schema;
pub mod store_impl;

pub use backend::DuckDbBackend;

/// Re-export the `duckdb` crate so consumers (especially tests) can use
/// `reftrack_duckdb::duckdb::params!` without an extra dependency.
pub use duckdb;
