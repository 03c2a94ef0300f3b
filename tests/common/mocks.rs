use async_trait::async_trait;
use robofsm::{Error, Result, actions::ActionDefinition, executor::ActionExecutor};
use std::sync::Mutex;

/// Mock executor that records every action it is asked to run
#[derive(Debug, Default)]
pub struct MockExecutor {
    pub executed: Mutex<Vec<String>>,
    pub failing: Mutex<Vec<String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the named action fail from now on
    pub fn fail_action(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn get_executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for MockExecutor {
    async fn execute(&self, action: &ActionDefinition) -> Result<()> {
        self.executed.lock().unwrap().push(action.name().to_string());

        if self.failing.lock().unwrap().iter().any(|n| n == action.name()) {
            return Err(Error::execution_failed(action.name(), "mock motor fault"));
        }
        Ok(())
    }
}
