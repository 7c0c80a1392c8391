pub mod config;
pub mod error;
pub mod event;
pub mod fraud;
pub mod metrics;
pub mod sheets;
pub mod store;
pub mod task;
