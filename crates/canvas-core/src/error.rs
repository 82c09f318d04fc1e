use thiserror::Error;

use crate::exchange::TransitionError;
use crate::graph::NodeId;

/// Errors raised by canvas operations.
///
/// None of these corrupt the graph: an operation that fails leaves the
/// store exactly as it found it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// Submitted text was empty after trimming whitespace.
    #[error("message content cannot be empty")]
    EmptyMessage,

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not an input node")]
    NotAnInput(NodeId),

    /// Branches may only be dragged out of a message node's exposed handles.
    #[error("node {node_id} cannot start a branch from handle {handle}")]
    InvalidBranchSource { node_id: NodeId, handle: String },

    #[error("unknown handle: {0}")]
    UnknownHandle(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

pub type Result<T> = std::result::Result<T, CanvasError>;
