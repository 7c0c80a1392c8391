use std::sync::Arc;

use reftrack_core::config::Config;
use reftrack_core::fraud::IpReputation;
use reftrack_core::sheets::SheetSink;
use reftrack_core::store::{CheckpointStore, EventStore, MetricsStore};
use reftrack_duckdb::DuckDbBackend;

use crate::pipeline::JobRegistry;

/// Shared worker state handed to the ingestion path, the tasks, and the
/// scheduler loops.
///
/// Storage is held as trait objects so tests can swap pieces; in the running
/// worker all three store handles point at the same [`DuckDbBackend`].
pub struct AppState {
    pub events: Arc<dyn EventStore>,
    pub metrics: Arc<dyn MetricsStore>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub sink: Arc<dyn SheetSink>,
    pub reputation: Arc<dyn IpReputation>,
    pub config: Arc<Config>,
    /// Job/task terminal states, queryable by job id for the lifetime of the
    /// worker. Permanent failures stay visible here.
    pub jobs: JobRegistry,
}

impl AppState {
    pub fn new(
        db: Arc<DuckDbBackend>,
        config: Config,
        sink: Arc<dyn SheetSink>,
        reputation: Arc<dyn IpReputation>,
    ) -> Self {
        Self {
            events: db.clone(),
            metrics: db.clone(),
            checkpoints: db,
            sink,
            reputation,
            config: Arc::new(config),
            jobs: JobRegistry::default(),
        }
    }
}
