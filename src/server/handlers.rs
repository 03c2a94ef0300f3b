use super::types::{
    CurrentStateResponse, LoadFsmResponse, RunStepRequest, StatusResponse, StepResponse,
    TriggersResponse,
};
use crate::{
    Error, Result,
    actions::{ActionCatalog, PaletteMetadata},
    fsm::{FsmEngine, FsmExport, FsmPayload},
};
use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<ActionCatalog>,
    pub engine: Arc<FsmEngine>,
}

/// Unwraps a JSON body, reporting malformed input as a 400.
fn json_body<T>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| Error::invalid_input(rejection.body_text()))
}

pub async fn list_actions(State(state): State<AppState>) -> Json<Vec<PaletteMetadata>> {
    info!("Listing available actions");
    Json(state.catalog.list().await)
}

pub async fn get_action(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>> {
    info!("Fetching action '{}'", name);
    let definition = state.catalog.get(&name).await?;
    Ok(Json(definition.to_document()))
}

pub async fn create_action(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<StatusResponse>)> {
    let payload = json_body(body)?;
    let name = state.catalog.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::success(format!(
            "Action '{}' created successfully",
            name
        ))),
    ))
}

pub async fn load_fsm(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<LoadFsmResponse>> {
    info!("Received FSM load request");
    let payload = FsmPayload::from_value(json_body(body)?)?;
    let outcome = state.engine.load(payload).await?;
    Ok(Json(LoadFsmResponse {
        status: "success".to_string(),
        message: format!("FSM '{}' loaded", outcome.name),
        initial_triggers: outcome.initial_triggers,
    }))
}

pub async fn get_full_fsm(State(state): State<AppState>) -> Json<FsmExport> {
    Json(state.engine.export().await)
}

pub async fn run_step(
    State(state): State<AppState>,
    body: std::result::Result<Json<RunStepRequest>, JsonRejection>,
) -> Result<Json<StepResponse>> {
    let request = json_body(body)?;
    let outcome = state.engine.step(&request.trigger).await?;
    Ok(Json(StepResponse {
        status: "success".to_string(),
        current_state: outcome.current_state,
        triggers: outcome.triggers,
    }))
}

pub async fn current_state(State(state): State<AppState>) -> Json<CurrentStateResponse> {
    Json(CurrentStateResponse {
        current_state: state.engine.current_state().await,
    })
}

pub async fn current_triggers(State(state): State<AppState>) -> Json<TriggersResponse> {
    Json(TriggersResponse {
        triggers: state.engine.available_triggers().await,
    })
}
