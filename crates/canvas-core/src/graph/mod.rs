//! Graph store: node and edge types plus the store that holds them.

pub mod edge;
pub mod ids;
pub mod node;
pub mod store;

pub use edge::{Edge, EdgeId, SourceHandle, TargetHandle};
pub use ids::IdGenerator;
pub use node::{
    InputData, MessageData, Node, NodeId, NodeKind, Position, Role, Size, INPUT_PLACEHOLDER,
};
pub use store::GraphStore;
