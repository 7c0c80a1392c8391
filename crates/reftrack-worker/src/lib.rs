pub mod ingest;
pub mod pipeline;
pub mod reputation;
pub mod scheduler;
pub mod sheets;
pub mod state;
pub mod tasks;
