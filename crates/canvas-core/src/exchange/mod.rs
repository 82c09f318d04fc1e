//! Exchange bookkeeping: the state machine plus the records the canvas
//! keeps for every in-flight or settled round trip.

pub mod state;

pub use state::{
    ExchangeEvent, ExchangeMachine, ExchangeOutcome, ExchangeState, StateTransition,
    TransitionError,
};

use crate::graph::NodeId;
use crate::history::ChatMessage;

/// One user/assistant round trip, keyed by its assistant node id.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub assistant_id: NodeId,
    /// X of the origin input; the follow-up input is placed in the same column.
    pub origin_x: f64,
    pub pinned: bool,
    pub machine: ExchangeMachine,
}

impl Exchange {
    pub fn state(&self) -> &ExchangeState {
        self.machine.state()
    }
}

/// Everything the model call needs, captured at submission time so the
/// response always lands on the right assistant node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeTicket {
    pub user_id: NodeId,
    pub assistant_id: NodeId,
    /// Reconstructed history with the just-submitted message appended.
    pub history: Vec<ChatMessage>,
    /// Canvas generation at submission; a reset in between voids the ticket.
    pub generation: u64,
}

/// A follow-up input waiting for its parent's height to be measured.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInput {
    pub parent_id: NodeId,
    pub x: f64,
    pub pinned: bool,
}

/// What happened when a model outcome was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// Content set; a follow-up input is pending.
    Completed,
    /// Error text set; the branch is a dead end.
    Failed,
    /// The assistant node no longer exists; nothing was changed.
    Discarded,
}
