use crate::{
    Error, Result,
    actions::{ActionCatalog, ActionDefinition},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const UNNAMED_FSM: &str = "UnnamedFSM";

/// A state as written by the editor: a bare name or an annotated object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateSpec {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl StateSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::Detailed { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub trigger: String,
    pub source: String,
    pub dest: String,
}

/// Reference from a state to a catalog action: either its catalog key, or a
/// full action document as emitted by an export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ActionRef {
    Name(String),
    Document(Map<String, Value>),
}

impl ActionRef {
    /// Resolves the reference for `state`. Inline documents bind to the
    /// catalog entry with identical content, falling back to the entry keyed
    /// by their `_palette.name`.
    pub async fn resolve(&self, state: &str, catalog: &ActionCatalog) -> Result<ActionDefinition> {
        match self {
            Self::Name(name) => catalog.get(name).await.map_err(|e| match e {
                Error::NotFound { name } => Error::invalid_input(format!(
                    "State '{}' references unknown action '{}'",
                    state, name
                )),
                other => other,
            }),
            Self::Document(document) => {
                if let Some(action) = catalog.find_by_document(document).await {
                    return Ok(action);
                }

                let hinted = document
                    .get("_palette")
                    .and_then(|palette| palette.get("name"))
                    .and_then(Value::as_str);
                match hinted {
                    Some(name) if catalog.contains(name).await => {
                        debug!(
                            "Inline action for state '{}' differs from catalog entry '{}'",
                            state, name
                        );
                        catalog.get(name).await
                    }
                    _ => Err(Error::invalid_input(format!(
                        "Inline action for state '{}' matches no catalog entry",
                        state
                    ))),
                }
            }
        }
    }
}

/// Incoming `load_fsm` body, before any structural checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FsmPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub states: Vec<StateSpec>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub initial_state: Option<String>,
    #[serde(default)]
    pub actions: BTreeMap<String, ActionRef>,
}

impl FsmPayload {
    pub fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::Object(map) if !map.is_empty() => {}
            _ => return Err(Error::invalid_input("Request body cannot be empty")),
        }
        serde_json::from_value(value)
            .map_err(|e| Error::invalid_input(format!("Malformed FSM definition: {}", e)))
    }
}

/// A validated FSM with its actions bound from the catalog. Never mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct FsmDefinition {
    name: String,
    states: Vec<StateSpec>,
    transitions: Vec<Transition>,
    initial_state: String,
    bound_actions: BTreeMap<String, ActionDefinition>,
}

impl FsmDefinition {
    /// Checks the graph, then resolves every action reference against the
    /// catalog. Any unknown reference rejects the whole definition.
    pub async fn build(payload: FsmPayload, catalog: &ActionCatalog) -> Result<Self> {
        let initial_state = validate_structure(&payload)?;

        let mut bound_actions = BTreeMap::new();
        for (state, reference) in &payload.actions {
            let action = reference.resolve(state, catalog).await?;
            debug!("Bound action '{}' to state '{}'", action.name(), state);
            bound_actions.insert(state.clone(), action);
        }

        Ok(Self {
            name: payload.name.unwrap_or_else(|| UNNAMED_FSM.to_string()),
            states: payload.states,
            transitions: payload.transitions,
            initial_state,
            bound_actions,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_state(&self) -> &str {
        &self.initial_state
    }

    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(StateSpec::name)
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Triggers leaving `state`, in definition order.
    pub fn triggers_from(&self, state: &str) -> Vec<String> {
        self.transitions
            .iter()
            .filter(|t| t.source == state)
            .map(|t| t.trigger.clone())
            .collect()
    }

    pub fn find_transition(&self, state: &str, trigger: &str) -> Option<&Transition> {
        self.transitions
            .iter()
            .find(|t| t.source == state && t.trigger == trigger)
    }

    pub fn bound_action(&self, state: &str) -> Option<&ActionDefinition> {
        self.bound_actions.get(state)
    }

    pub fn export(&self, current_state: &str) -> FsmExport {
        let actions = self
            .bound_actions
            .iter()
            .map(|(state, action)| (state.clone(), action.to_document()))
            .collect();

        FsmExport {
            name: self.name.clone(),
            states: self.states.clone(),
            transitions: self.transitions.clone(),
            initial_state: Some(self.initial_state.clone()),
            current_state: Some(current_state.to_string()),
            actions,
        }
    }
}

/// Graph checks that need no catalog. Returns the initial state.
pub fn validate_structure(payload: &FsmPayload) -> Result<String> {
    let mut states = HashSet::new();
    for state in &payload.states {
        let name = state.name();
        if name.is_empty() {
            return Err(Error::invalid_input("State names cannot be empty"));
        }
        if !states.insert(name) {
            return Err(Error::invalid_input(format!("Duplicate state '{}'", name)));
        }
    }

    let initial_state = payload
        .initial_state
        .as_deref()
        .ok_or_else(|| Error::invalid_input("'initial_state' is required"))?;
    if !states.contains(initial_state) {
        return Err(Error::invalid_input(format!(
            "Initial state '{}' is not one of the declared states",
            initial_state
        )));
    }

    let mut dispatch = HashSet::new();
    for t in &payload.transitions {
        if t.trigger.is_empty() {
            return Err(Error::invalid_input(format!(
                "Transition {} -> {} has an empty trigger",
                t.source, t.dest
            )));
        }
        for endpoint in [&t.source, &t.dest] {
            if !states.contains(endpoint.as_str()) {
                return Err(Error::invalid_input(format!(
                    "Transition '{}' references unknown state '{}'",
                    t.trigger, endpoint
                )));
            }
        }
        if !dispatch.insert((t.source.as_str(), t.trigger.as_str())) {
            return Err(Error::invalid_input(format!(
                "Trigger '{}' is defined more than once from state '{}'",
                t.trigger, t.source
            )));
        }
    }

    for state in payload.actions.keys() {
        if !states.contains(state.as_str()) {
            return Err(Error::invalid_input(format!(
                "Action bound to unknown state '{}'",
                state
            )));
        }
    }

    Ok(initial_state.to_string())
}

/// Structural snapshot returned by `get_full_fsm`. Loading it again yields
/// the same definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsmExport {
    pub name: String,
    pub states: Vec<StateSpec>,
    pub transitions: Vec<Transition>,
    pub initial_state: Option<String>,
    pub current_state: Option<String>,
    pub actions: BTreeMap<String, Value>,
}
