use super::ActionExecutor;
use crate::{Error, Result, actions::ActionDefinition, config::ExecutorConfig};
use async_trait::async_trait;
use std::{collections::HashMap, time::Duration};
use tracing::{debug, warn};

/// Forwards each action document to the robot's command endpoint.
pub struct HttpExecutor {
    url: String,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| Error::config("HTTP executor requires the 'url' field"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        debug!("Creating HTTP executor for: {}", url);

        Ok(Self {
            url,
            headers: config.headers.clone(),
            client,
        })
    }
}

#[async_trait]
impl ActionExecutor for HttpExecutor {
    async fn execute(&self, action: &ActionDefinition) -> Result<()> {
        let mut req_builder = self.client.post(&self.url).json(action);
        for (key, value) in &self.headers {
            req_builder = req_builder.header(key, value);
        }

        let response = req_builder.send().await.map_err(|e| {
            warn!("Failed to send action '{}': {}", action.name(), e);
            Error::execution_failed(action.name(), format!("request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::execution_failed(
                action.name(),
                format!("robot responded with {}: {}", status, body),
            ));
        }

        debug!("Action '{}' executed ({})", action.name(), status);
        Ok(())
    }
}
