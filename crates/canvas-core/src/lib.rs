//! canvas-core - Branching conversation graph engine
//!
//! This crate holds everything that does not touch the network:
//! - `graph` - nodes, edges, handles and the store that owns them
//! - `history` - transcript reconstruction along parent edges
//! - `layout` - parent-centered vertical stacking
//! - `exchange` - per-exchange state machine and records
//! - `branch` - spawning side conversations from drag gestures
//! - `canvas` - the session object that applies every event
//! - `orchestrator` - async glue between the canvas and a [`ModelClient`]

pub mod branch;
pub mod canvas;
pub mod error;
pub mod exchange;
pub mod graph;
pub mod history;
pub mod layout;
pub mod model;
pub mod orchestrator;
pub mod root;

pub use branch::{spawn_branch, ConnectEnd, Viewport};
pub use canvas::{Canvas, MeasureReport};
pub use error::{CanvasError, Result};
pub use exchange::{
    Exchange, ExchangeEvent, ExchangeMachine, ExchangeOutcome, ExchangeState, ExchangeTicket,
    PendingInput, Settlement, TransitionError,
};
pub use graph::{
    Edge, EdgeId, GraphStore, IdGenerator, InputData, MessageData, Node, NodeId, NodeKind,
    Position, Role, Size, SourceHandle, TargetHandle, INPUT_PLACEHOLDER,
};
pub use history::{reconstruct, ChatMessage};
pub use layout::{relax_around, DEFAULT_NODE_HEIGHT, LAYOUT_EPSILON, NODE_GAP};
pub use model::{ModelClient, ModelError, DEFAULT_MAX_TOKENS, DEFAULT_SYSTEM_PROMPT};
pub use orchestrator::Orchestrator;
pub use root::{seed_graph, WELCOME_MESSAGE, WELCOME_NODE_ID};
