use super::types::{FsmDefinition, FsmExport, FsmPayload};
use crate::{Error, Result, actions::ActionCatalog, executor::ActionExecutor};
use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Name reported before any FSM has been loaded.
pub const EMPTY_FSM_NAME: &str = "EmptyFSM";

/// Outcome of a successful load, read under the same lock that installed it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    pub name: String,
    pub initial_triggers: Vec<String>,
}

/// Outcome of a successful step: the new state and the triggers leaving it.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub current_state: String,
    pub triggers: Vec<String>,
}

#[derive(Debug)]
enum EngineState {
    Empty,
    Loaded {
        active: FsmDefinition,
        current_state: String,
    },
}

/// Owns the active FSM and the cursor into it. Every operation takes the
/// same lock, so a step never runs against a definition being replaced.
pub struct FsmEngine {
    catalog: Arc<ActionCatalog>,
    executor: Arc<dyn ActionExecutor>,
    state: Mutex<EngineState>,
}

impl FsmEngine {
    pub fn new(catalog: Arc<ActionCatalog>, executor: Arc<dyn ActionExecutor>) -> Self {
        info!("FSM engine started with an empty definition");
        Self {
            catalog,
            executor,
            state: Mutex::new(EngineState::Empty),
        }
    }

    /// Replaces the active FSM wholesale and rewinds to its initial state.
    /// On error the previous definition and position are untouched.
    pub async fn load(&self, payload: FsmPayload) -> Result<LoadOutcome> {
        let mut state = self.state.lock().await;

        let definition = FsmDefinition::build(payload, &self.catalog).await?;
        let current_state = definition.initial_state().to_string();
        let outcome = LoadOutcome {
            name: definition.name().to_string(),
            initial_triggers: definition.triggers_from(&current_state),
        };

        if let EngineState::Loaded { active, .. } = &*state {
            debug!("Discarding FSM '{}'", active.name());
        }
        info!(
            "FSM '{}' loaded: {} transitions, {} bound actions, initial state '{}'",
            definition.name(),
            definition.transitions().len(),
            definition.states().filter(|s| definition.bound_action(s).is_some()).count(),
            current_state
        );

        *state = EngineState::Loaded {
            active: definition,
            current_state,
        };
        Ok(outcome)
    }

    pub async fn export(&self) -> FsmExport {
        let state = self.state.lock().await;
        match &*state {
            EngineState::Empty => FsmExport {
                name: EMPTY_FSM_NAME.to_string(),
                states: Vec::new(),
                transitions: Vec::new(),
                initial_state: None,
                current_state: None,
                actions: BTreeMap::new(),
            },
            EngineState::Loaded {
                active,
                current_state,
            } => active.export(current_state),
        }
    }

    /// Name of the active FSM.
    pub async fn name(&self) -> String {
        match &*self.state.lock().await {
            EngineState::Empty => EMPTY_FSM_NAME.to_string(),
            EngineState::Loaded { active, .. } => active.name().to_string(),
        }
    }

    pub async fn current_state(&self) -> Option<String> {
        match &*self.state.lock().await {
            EngineState::Empty => None,
            EngineState::Loaded { current_state, .. } => Some(current_state.clone()),
        }
    }

    /// Triggers leaving the current state. Empty at a terminal state.
    pub async fn available_triggers(&self) -> Vec<String> {
        match &*self.state.lock().await {
            EngineState::Empty => Vec::new(),
            EngineState::Loaded {
                active,
                current_state,
            } => active.triggers_from(current_state),
        }
    }

    /// Fires `trigger` from the current state. The destination's action runs
    /// first; the cursor only moves if it succeeds.
    pub async fn step(&self, trigger: &str) -> Result<StepOutcome> {
        let mut state = self.state.lock().await;

        let EngineState::Loaded {
            active,
            current_state,
        } = &mut *state
        else {
            warn!("Step '{}' rejected: no FSM loaded", trigger);
            return Err(Error::invalid_trigger(EMPTY_FSM_NAME, trigger));
        };

        let dest = match active.find_transition(current_state, trigger) {
            Some(transition) => transition.dest.clone(),
            None => {
                warn!(
                    "Invalid trigger '{}' from state '{}'",
                    trigger, current_state
                );
                return Err(Error::invalid_trigger(current_state.as_str(), trigger));
            }
        };

        if let Some(action) = active.bound_action(&dest) {
            debug!("Executing action '{}' for state '{}'", action.name(), dest);
            if let Err(e) = self.executor.execute(action).await {
                warn!(
                    "Action '{}' failed, staying in state '{}': {}",
                    action.name(),
                    current_state,
                    e
                );
                return Err(match e {
                    Error::ActionExecutionFailed { .. } => e,
                    other => Error::execution_failed(action.name(), other.to_string()),
                });
            }
        }

        info!(
            "FSM '{}' transition: {} -> {} (trigger: {})",
            active.name(),
            current_state,
            dest,
            trigger
        );
        let triggers = active.triggers_from(&dest);
        *current_state = dest.clone();
        Ok(StepOutcome {
            current_state: dest,
            triggers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actions::{ActionDefinition, MemoryActionStore},
        executor::LoggingExecutor,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::sync::Mutex as StdMutex;

    /// Records executed actions and fails the ones listed in `failing`.
    #[derive(Default)]
    struct RecordingExecutor {
        executed: StdMutex<Vec<String>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl ActionExecutor for RecordingExecutor {
        async fn execute(&self, action: &ActionDefinition) -> Result<()> {
            self.executed.lock().unwrap().push(action.name().to_string());
            if self.failing.iter().any(|name| name == action.name()) {
                return Err(Error::internal("joint limit exceeded"));
            }
            Ok(())
        }
    }

    async fn catalog_with(names: &[&str]) -> Arc<ActionCatalog> {
        let store = Arc::new(MemoryActionStore::new());
        let catalog = ActionCatalog::load(store).await.unwrap();
        for name in names {
            catalog
                .create(json!({"_palette": {"name": name}, "steps": []}))
                .await
                .unwrap();
        }
        Arc::new(catalog)
    }

    fn payload(value: Value) -> FsmPayload {
        FsmPayload::from_value(value).unwrap()
    }

    fn go_fsm() -> FsmPayload {
        payload(json!({
            "name": "demo",
            "states": ["A", "B"],
            "transitions": [{"trigger": "go", "source": "A", "dest": "B"}],
            "initial_state": "A",
            "actions": {"B": "wave"}
        }))
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let engine = FsmEngine::new(catalog_with(&[]).await, Arc::new(LoggingExecutor));
        let export = engine.export().await;
        assert_eq!(export.name, EMPTY_FSM_NAME);
        assert!(export.states.is_empty());
        assert_eq!(export.current_state, None);
        assert!(engine.available_triggers().await.is_empty());
        assert!(matches!(
            engine.step("go").await,
            Err(Error::InvalidTrigger { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_and_step() {
        let executor = Arc::new(RecordingExecutor::default());
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, executor.clone());

        let loaded = engine.load(go_fsm()).await.unwrap();
        assert_eq!(loaded.name, "demo");
        assert_eq!(loaded.initial_triggers, vec!["go".to_string()]);
        assert_eq!(engine.available_triggers().await, vec!["go".to_string()]);

        let stepped = engine.step("go").await.unwrap();
        assert_eq!(stepped.current_state, "B");
        assert!(stepped.triggers.is_empty());
        assert_eq!(engine.current_state().await.as_deref(), Some("B"));
        assert_eq!(*executor.executed.lock().unwrap(), vec!["wave".to_string()]);

        assert!(engine.available_triggers().await.is_empty());
        assert!(matches!(
            engine.step("go").await,
            Err(Error::InvalidTrigger { ref state, .. }) if state == "B"
        ));
    }

    #[tokio::test]
    async fn test_failed_action_keeps_state() {
        let executor = Arc::new(RecordingExecutor {
            failing: vec!["wave".to_string()],
            ..Default::default()
        });
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, executor);
        engine.load(go_fsm()).await.unwrap();

        let err = engine.step("go").await.unwrap_err();
        assert!(matches!(err, Error::ActionExecutionFailed { ref action, .. } if action == "wave"));
        assert_eq!(engine.current_state().await.as_deref(), Some("A"));
        assert_eq!(engine.available_triggers().await, vec!["go".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_load_keeps_previous_definition() {
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, Arc::new(LoggingExecutor));
        engine.load(go_fsm()).await.unwrap();
        engine.step("go").await.unwrap();

        let bad = payload(json!({"name": "bad", "states": ["X"], "initial_state": "Y"}));
        assert!(matches!(engine.load(bad).await, Err(Error::InvalidInput(_))));

        assert_eq!(engine.name().await, "demo");
        assert_eq!(engine.current_state().await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_unresolved_action_rejects_load() {
        let engine = FsmEngine::new(catalog_with(&[]).await, Arc::new(LoggingExecutor));
        let err = engine.load(go_fsm()).await.unwrap_err();
        match err {
            Error::InvalidInput(msg) => assert!(msg.contains("wave")),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(engine.name().await, EMPTY_FSM_NAME);
    }

    #[tokio::test]
    async fn test_export_after_load_reports_initial_state() {
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, Arc::new(LoggingExecutor));
        engine.load(go_fsm()).await.unwrap();

        let export = engine.export().await;
        assert_eq!(export.name, "demo");
        assert_eq!(export.initial_state.as_deref(), Some("A"));
        assert_eq!(export.current_state.as_deref(), Some("A"));
        assert_eq!(
            export.actions.get("B"),
            Some(&json!({"_palette": {"name": "wave"}, "steps": []}))
        );
    }

    #[tokio::test]
    async fn test_export_reloads_verbatim() {
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, Arc::new(LoggingExecutor));
        engine.load(go_fsm()).await.unwrap();
        engine.step("go").await.unwrap();

        let export = engine.export().await;
        let reloaded = payload(serde_json::to_value(&export).unwrap());
        engine.load(reloaded).await.unwrap();

        let again = engine.export().await;
        assert_eq!(again.current_state.as_deref(), Some("A"));
        assert_eq!(again.transitions, export.transitions);
        assert_eq!(again.actions, export.actions);
    }

    #[tokio::test]
    async fn test_reload_resets_position() {
        let engine = FsmEngine::new(catalog_with(&["wave"]).await, Arc::new(LoggingExecutor));
        engine.load(go_fsm()).await.unwrap();
        engine.step("go").await.unwrap();

        engine.load(go_fsm()).await.unwrap();
        assert_eq!(engine.current_state().await.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_states_without_actions_step_freely() {
        let executor = Arc::new(RecordingExecutor::default());
        let engine = FsmEngine::new(catalog_with(&[]).await, executor.clone());
        engine
            .load(payload(json!({
                "states": ["idle", "busy"],
                "transitions": [
                    {"trigger": "start", "source": "idle", "dest": "busy"},
                    {"trigger": "stop", "source": "busy", "dest": "idle"}
                ],
                "initial_state": "idle"
            })))
            .await
            .unwrap();

        assert_eq!(engine.step("start").await.unwrap().current_state, "busy");
        assert_eq!(engine.step("stop").await.unwrap().current_state, "idle");
        assert!(executor.executed.lock().unwrap().is_empty());
        assert_eq!(engine.name().await, crate::fsm::UNNAMED_FSM);
    }

    #[tokio::test]
    async fn test_step_outcome_lists_triggers_of_new_state() {
        let engine = FsmEngine::new(catalog_with(&[]).await, Arc::new(LoggingExecutor));
        engine
            .load(payload(json!({
                "name": "loop",
                "states": ["A", "B"],
                "transitions": [
                    {"trigger": "go", "source": "A", "dest": "B"},
                    {"trigger": "back", "source": "B", "dest": "A"},
                    {"trigger": "stay", "source": "B", "dest": "B"}
                ],
                "initial_state": "A"
            })))
            .await
            .unwrap();

        let stepped = engine.step("go").await.unwrap();
        assert_eq!(stepped.current_state, "B");
        assert_eq!(stepped.triggers, vec!["back".to_string(), "stay".to_string()]);

        let stepped = engine.step("back").await.unwrap();
        assert_eq!(stepped.current_state, "A");
        assert_eq!(stepped.triggers, vec!["go".to_string()]);
    }

    #[tokio::test]
    async fn test_export_reloads_when_palette_name_is_missing_or_differs() {
        let store = Arc::new(MemoryActionStore::new());
        store
            .insert_raw("wave", r#"{"_palette": {"label": "Wave"}, "steps": []}"#)
            .await;
        store
            .insert_raw("nod", r#"{"_palette": {"name": "bow"}, "steps": [2]}"#)
            .await;
        let catalog = Arc::new(ActionCatalog::load(store).await.unwrap());
        let engine = FsmEngine::new(catalog, Arc::new(LoggingExecutor));

        engine
            .load(payload(json!({
                "name": "greet",
                "states": ["A", "B", "C"],
                "transitions": [
                    {"trigger": "go", "source": "A", "dest": "B"},
                    {"trigger": "next", "source": "B", "dest": "C"}
                ],
                "initial_state": "A",
                "actions": {"B": "wave", "C": "nod"}
            })))
            .await
            .unwrap();

        let export = engine.export().await;
        assert_eq!(
            export.actions.get("B"),
            Some(&json!({"_palette": {"label": "Wave"}, "steps": []}))
        );

        let reloaded = payload(serde_json::to_value(&export).unwrap());
        let outcome = engine.load(reloaded).await.unwrap();
        assert_eq!(outcome.name, "greet");
        assert_eq!(engine.export().await.actions, export.actions);
    }
}
