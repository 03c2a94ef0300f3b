mod engine;
mod types;

pub use engine::{EMPTY_FSM_NAME, FsmEngine, LoadOutcome, StepOutcome};
pub use types::{
    ActionRef, FsmDefinition, FsmExport, FsmPayload, StateSpec, Transition, UNNAMED_FSM,
    validate_structure,
};
