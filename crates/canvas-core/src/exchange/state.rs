//! Exchange states - lifecycle of one user/assistant round trip
//!
//! `AwaitingInput -> Submitting -> AwaitingModel -> Settled(success | error)`

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExchangeState {
    /// An input node is on the canvas waiting for text.
    AwaitingInput,
    /// Non-empty text was accepted; the message pair is being built.
    Submitting,
    /// The model call is outstanding.
    AwaitingModel,
    /// The assistant node received its final content.
    Settled { outcome: ExchangeOutcome },
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeState::Settled { .. })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeOutcome {
    Success,
    Error { message: String },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExchangeEvent {
    Submit,
    Dispatch,
    ModelResponded,
    ModelFailed { message: String },
}

impl ExchangeEvent {
    fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::Submit => "submit",
            ExchangeEvent::Dispatch => "dispatch",
            ExchangeEvent::ModelResponded => "model_responded",
            ExchangeEvent::ModelFailed { .. } => "model_failed",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransitionError {
    #[error("Invalid transition from {from:?} with event {event}")]
    InvalidTransition { from: ExchangeState, event: String },

    #[error("Exchange already settled: {0:?}")]
    TerminalState(ExchangeState),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    pub from: ExchangeState,
    pub to: ExchangeState,
    pub event: ExchangeEvent,
}

/// Per-exchange state machine with its transition log.
#[derive(Debug, Clone)]
pub struct ExchangeMachine {
    current_state: ExchangeState,
    history: Vec<StateTransition>,
}

impl Default for ExchangeMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ExchangeMachine {
    pub fn new() -> Self {
        Self {
            current_state: ExchangeState::AwaitingInput,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &ExchangeState {
        &self.current_state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    /// Apply `event`, rejecting anything the lifecycle does not allow.
    pub fn handle_event(&mut self, event: ExchangeEvent) -> Result<&ExchangeState, TransitionError> {
        let next = Self::compute_next_state(&self.current_state, &event)?;

        self.history.push(StateTransition {
            from: self.current_state.clone(),
            to: next.clone(),
            event,
        });
        self.current_state = next;

        Ok(&self.current_state)
    }

    fn compute_next_state(
        state: &ExchangeState,
        event: &ExchangeEvent,
    ) -> Result<ExchangeState, TransitionError> {
        use ExchangeEvent::*;
        use ExchangeState::*;

        match (state, event) {
            (AwaitingInput, Submit) => Ok(Submitting),
            (Submitting, Dispatch) => Ok(AwaitingModel),
            (AwaitingModel, ModelResponded) => Ok(Settled {
                outcome: ExchangeOutcome::Success,
            }),
            (AwaitingModel, ModelFailed { message }) => Ok(Settled {
                outcome: ExchangeOutcome::Error {
                    message: message.clone(),
                },
            }),
            (Settled { .. }, _) => Err(TransitionError::TerminalState(state.clone())),
            (from, event) => Err(TransitionError::InvalidTransition {
                from: from.clone(),
                event: event.name().to_string(),
            }),
        }
    }
}
