use crate::Error;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Deserialize)]
pub struct RunStepRequest {
    pub trigger: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadFsmResponse {
    pub status: String,
    pub message: String,
    pub initial_triggers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepResponse {
    pub status: String,
    pub current_state: String,
    pub triggers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentStateResponse {
    pub current_state: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TriggersResponse {
    pub triggers: Vec<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        (status, Json(StatusResponse::error(self.to_string()))).into_response()
    }
}
