pub mod handlers;
pub mod types;

use crate::{
    Result,
    actions::{ActionCatalog, FileActionStore},
    config::Config,
    executor::create_executor,
    fsm::FsmEngine,
};
use axum::{
    Router,
    routing::{get, post},
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Route prefix identifying the robot and app instance, e.g.
/// `/pyicub/icub/DynamicFSMServer`.
pub fn base_path(config: &Config) -> String {
    format!(
        "/{}/{}/{}",
        config.server.prefix.trim_matches('/'),
        config.robot.name,
        config.robot.app_name
    )
}

const ROUTES: &[(&str, &str)] = &[
    ("GET", "/actions"),
    ("GET", "/actions/:name"),
    ("POST", "/actions"),
    ("POST", "/load_fsm"),
    ("GET|POST", "/get_full_fsm"),
    ("POST", "/fsm.runStep"),
    ("POST", "/run_step"),
    ("GET", "/fsm.getCurrentState"),
    ("GET", "/fsm.getCurrentTriggers"),
];

pub fn router(state: AppState, base_path: &str) -> Router {
    let api = Router::new()
        .route(
            "/actions",
            get(handlers::list_actions).post(handlers::create_action),
        )
        .route("/actions/:name", get(handlers::get_action))
        .route("/load_fsm", post(handlers::load_fsm))
        .route(
            "/get_full_fsm",
            get(handlers::get_full_fsm).post(handlers::get_full_fsm),
        )
        .route("/fsm.runStep", post(handlers::run_step))
        .route("/run_step", post(handlers::run_step))
        .route("/fsm.getCurrentState", get(handlers::current_state))
        .route("/fsm.getCurrentTriggers", get(handlers::current_triggers));

    Router::new()
        .nest(base_path, api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    // Initialize action storage and catalog
    let store = FileActionStore::new(&config.actions.dir);
    store.init().await?;
    info!("Loading action definitions from '{}'", store.dir().display());
    let catalog = Arc::new(ActionCatalog::load(Arc::new(store)).await?);

    // Initialize engine
    let executor = create_executor(&config.executor)?;
    let engine = Arc::new(FsmEngine::new(catalog.clone(), executor));

    let app_state = AppState { catalog, engine };

    let base = base_path(&config);
    let app = router(app_state, &base);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {} for robot '{}'", addr, config.robot.name);
    for (method, route) in ROUTES {
        info!("  {:<8} http://{}{}{}", method, addr, base, route);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
