use thiserror::Error;

use crate::flows::states::{FlowAction, FlowContext, FlowEvent, FlowState, TransitionOutcome};

pub trait FlowDefinition {
    fn initial_state(&self) -> FlowState;
    fn evaluate(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>;
}

/// Flow of the accumulating button families: buttons append terms to a set
/// until someone rolls or clears it.
#[derive(Clone, Debug, Default)]
pub struct SetFlow;

impl FlowDefinition for SetFlow {
    fn initial_state(&self) -> FlowState {
        FlowState::Init
    }

    fn evaluate(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_set(current, event, context)
    }
}

pub struct FlowEngine<F> {
    flow: F,
}

impl<F> FlowEngine<F>
where
    F: FlowDefinition,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn initial_state(&self) -> FlowState {
        self.flow.initial_state()
    }

    pub fn apply(
        &self,
        current: &FlowState,
        event: &FlowEvent,
        context: &FlowContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        self.flow.evaluate(current, event, context)
    }
}

impl Default for FlowEngine<SetFlow> {
    fn default() -> Self {
        Self::new(SetFlow)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing required fields before transition from {state:?}: {missing_fields:?}")]
    MissingRequiredFields { state: FlowState, missing_fields: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: FlowState, event: FlowEvent },
}

fn transition_set(
    current: &FlowState,
    event: &FlowEvent,
    context: &FlowContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use FlowAction::{EvaluateExpression, ResetPrompt, UpdatePrompt};
    use FlowEvent::{ActorMismatch, AppendTerm, Clear, Finish, Undo};
    use FlowState::{Accumulating, Cleared, Init, LockedByOtherUser};

    let (to, actions) = match (current, event) {
        (Init | Cleared | Accumulating | LockedByOtherUser, AppendTerm) => {
            (Accumulating, vec![UpdatePrompt])
        }
        (Accumulating | LockedByOtherUser, Undo) => (Accumulating, vec![UpdatePrompt]),
        (Accumulating | LockedByOtherUser, Finish) => {
            if context.expression.is_empty() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    state: current.clone(),
                    missing_fields: vec!["expression".to_owned()],
                });
            }
            (FlowState::Finished, vec![EvaluateExpression, ResetPrompt])
        }
        (_, Clear) => (Cleared, vec![ResetPrompt]),
        (Init | Accumulating, ActorMismatch) => (LockedByOtherUser, Vec::new()),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: current.clone(),
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: current.clone(), to, event: event.clone(), actions })
}
