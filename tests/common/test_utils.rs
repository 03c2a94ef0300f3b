use super::mocks::MockExecutor;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use robofsm::{
    actions::{ActionCatalog, FileActionStore, MemoryActionStore},
    config::Config,
    fsm::{FsmEngine, FsmPayload},
    server::{self, handlers::AppState},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;

pub const BASE: &str = "/pyicub/icubSim/TestApp";

/// Create a test configuration pointing at `actions_dir`
pub fn create_test_config(actions_dir: &str) -> Config {
    let mut config = Config::default();
    config.robot.name = "icubSim".to_string();
    config.robot.app_name = "TestApp".to_string();
    config.actions.dir = actions_dir.to_string();
    config
}

/// Create a temporary directory for action documents
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Action document with a palette entry and a small body
pub fn action_json(name: &str) -> Value {
    json!({
        "_palette": {"name": name, "label": name.to_uppercase(), "icon": "smart_toy"},
        "steps": [{"part": "head", "target": [0, 15, 0], "duration": 1.5}]
    })
}

/// Two-state FSM: A --go--> B, with `action` bound to B
pub fn go_fsm_json(action: &str) -> Value {
    json!({
        "name": "GoFSM",
        "states": ["A", "B"],
        "transitions": [{"trigger": "go", "source": "A", "dest": "B"}],
        "initial_state": "A",
        "actions": {"B": action}
    })
}

pub fn go_fsm(action: &str) -> FsmPayload {
    FsmPayload::from_value(go_fsm_json(action)).unwrap()
}

/// Catalog over an in-memory store, seeded with `names`
pub async fn create_memory_catalog(names: &[&str]) -> (Arc<MemoryActionStore>, Arc<ActionCatalog>) {
    let store = Arc::new(MemoryActionStore::new());
    let catalog = ActionCatalog::load(store.clone()).await.unwrap();
    for name in names {
        catalog.create(action_json(name)).await.unwrap();
    }
    (store, Arc::new(catalog))
}

/// Catalog over a file store rooted at `dir`
pub async fn create_file_catalog(dir: &TempDir) -> ActionCatalog {
    let store = FileActionStore::new(dir.path());
    store.init().await.unwrap();
    ActionCatalog::load(Arc::new(store)).await.unwrap()
}

pub async fn create_engine(names: &[&str]) -> (Arc<MockExecutor>, FsmEngine) {
    let (_store, catalog) = create_memory_catalog(names).await;
    let executor = Arc::new(MockExecutor::new());
    let engine = FsmEngine::new(catalog, executor.clone());
    (executor, engine)
}

/// Full router over a memory catalog and a mock executor
pub async fn create_test_app(names: &[&str]) -> (Router, Arc<MockExecutor>) {
    let (_store, catalog) = create_memory_catalog(names).await;
    let executor = Arc::new(MockExecutor::new());
    let engine = Arc::new(FsmEngine::new(catalog.clone(), executor.clone()));
    let app = server::router(AppState { catalog, engine }, BASE);
    (app, executor)
}

pub fn json_request(method: &str, path: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(format!("{}{}", BASE, path))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(format!("{}{}", BASE, path))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 9001
  logs:
    level: "debug"

robot:
  name: "icubSim"
  app_name: "TestApp"

actions:
  dir: "/tmp/robofsm-actions"

executor:
  type: "http"
  url: "http://localhost:8000/commands"
  headers:
    x-robot: "icubSim"
"#;
