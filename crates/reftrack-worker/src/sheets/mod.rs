pub mod client;
pub mod credentials;
pub mod memory;

pub use client::GoogleSheetsSink;
pub use credentials::{parse_service_account_json, ServiceAccountKey};
pub use memory::MemorySheet;
