mod http;

pub use http::HttpExecutor;

use crate::{
    Result,
    actions::ActionDefinition,
    config::{ExecutorConfig, ExecutorType},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Performs the robot commands behind a bound action.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &ActionDefinition) -> Result<()>;
}

/// Dry-run executor: logs the action and reports success.
#[derive(Debug, Default)]
pub struct LoggingExecutor;

#[async_trait]
impl ActionExecutor for LoggingExecutor {
    async fn execute(&self, action: &ActionDefinition) -> Result<()> {
        info!(
            "Dry run: would execute action '{}' ({} document fields)",
            action.name(),
            action.document().len()
        );
        Ok(())
    }
}

pub fn create_executor(config: &ExecutorConfig) -> Result<Arc<dyn ActionExecutor>> {
    match config.executor_type {
        ExecutorType::Log => Ok(Arc::new(LoggingExecutor)),
        ExecutorType::Http => Ok(Arc::new(HttpExecutor::new(config)?)),
    }
}
