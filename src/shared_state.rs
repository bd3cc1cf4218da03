use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::models::pv::PipelineConfig;
use crate::services::pipeline::Pipeline;

/// State shared by every request handler. The pipeline is built once at
/// startup and is read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<PipelineConfig>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let pipeline = Pipeline::new(&config)?;
        Ok(Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
