//! Canvas - one user session over the conversation graph
//!
//! The canvas owns the graph store, the id generator, the viewport, the
//! exchange records and the pending follow-up inputs. Every event handler
//! takes `&mut self`, so each event is one serialized read-modify-write of
//! the whole session state.

use std::collections::HashMap;

use crate::branch::{spawn_branch, ConnectEnd, Viewport};
use crate::error::{CanvasError, Result};
use crate::exchange::{
    Exchange, ExchangeEvent, ExchangeMachine, ExchangeState, ExchangeTicket, PendingInput,
    Settlement,
};
use crate::graph::{
    Edge, GraphStore, IdGenerator, InputData, MessageData, Node, NodeId, NodeKind, Position, Role,
    Size, SourceHandle, TargetHandle,
};
use crate::history::{reconstruct, ChatMessage};
use crate::layout::{relax_around, stacked_y, DEFAULT_NODE_HEIGHT, NODE_GAP};
use crate::model::ModelError;
use crate::root::seed_graph;

/// Result of applying a batch of size measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureReport {
    pub moved: Vec<NodeId>,
    /// Follow-up inputs materialized because their parent got a height.
    pub inserted: Vec<NodeId>,
}

#[derive(Debug)]
pub struct Canvas {
    graph: GraphStore,
    ids: IdGenerator,
    viewport: Viewport,
    exchanges: HashMap<NodeId, Exchange>,
    /// One slot per parent, so overlapping completions never overwrite
    /// each other.
    pending: HashMap<NodeId, PendingInput>,
    /// Bumped on every reset. Ids restart after a reset, so a ticket from an
    /// earlier generation could otherwise match a fresh node.
    generation: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        let mut ids = IdGenerator::new();
        let graph = seed_graph(&mut ids);
        Self {
            graph,
            ids,
            viewport: Viewport::default(),
            exchanges: HashMap::new(),
            pending: HashMap::new(),
            generation: 0,
        }
    }

    /// Discard everything and reseed, as on logout.
    pub fn reset(&mut self) {
        tracing::info!(nodes = self.graph.nodes().len(), "Canvas: resetting session");
        self.ids.reset();
        self.graph = seed_graph(&mut self.ids);
        self.exchanges.clear();
        self.pending.clear();
        self.viewport = Viewport::default();
        self.generation += 1;
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn history(&self, node_id: &str) -> Vec<ChatMessage> {
        reconstruct(&self.graph, node_id)
    }

    pub fn exchange(&self, assistant_id: &str) -> Option<&Exchange> {
        self.exchanges.get(assistant_id)
    }

    pub fn pending_inputs(&self) -> impl Iterator<Item = &PendingInput> {
        self.pending.values()
    }

    /// Lifecycle state of the conversation frontier at `node_id`.
    pub fn exchange_state(&self, node_id: &str) -> Option<ExchangeState> {
        let node = self.graph.node(node_id)?;
        match &node.kind {
            NodeKind::Input(_) => Some(ExchangeState::AwaitingInput),
            NodeKind::Message(_) => self.exchanges.get(node_id).map(|e| e.state().clone()),
        }
    }

    /// Keystroke-level draft update for an input node.
    pub fn update_draft(&mut self, input_id: &str, text: &str) -> Result<()> {
        let node = self
            .graph
            .node_mut(input_id)
            .ok_or_else(|| CanvasError::NodeNotFound(input_id.to_string()))?;
        let input = node
            .as_input_mut()
            .ok_or_else(|| CanvasError::NotAnInput(input_id.to_string()))?;
        input.draft = text.to_string();
        Ok(())
    }

    /// Submit whatever is currently typed into `input_id`.
    pub fn submit_draft(&mut self, input_id: &str) -> Result<ExchangeTicket> {
        let draft = self
            .graph
            .node(input_id)
            .ok_or_else(|| CanvasError::NodeNotFound(input_id.to_string()))?
            .as_input()
            .ok_or_else(|| CanvasError::NotAnInput(input_id.to_string()))?
            .draft
            .clone();
        self.begin_exchange(input_id, &draft)
    }

    /// Accept a submission: replace the input node with a user/assistant
    /// pair and return the ticket for the model call.
    ///
    /// Empty or whitespace-only text is rejected before anything changes.
    pub fn begin_exchange(&mut self, input_id: &str, text: &str) -> Result<ExchangeTicket> {
        if text.trim().is_empty() {
            return Err(CanvasError::EmptyMessage);
        }

        let input_node = self
            .graph
            .node(input_id)
            .ok_or_else(|| CanvasError::NodeNotFound(input_id.to_string()))?;
        let input = input_node
            .as_input()
            .ok_or_else(|| CanvasError::NotAnInput(input_id.to_string()))?;
        let pinned = input.pinned;
        let is_anchor = input.is_anchor;
        let origin = input_node.position;

        let mut machine = ExchangeMachine::new();
        machine.handle_event(ExchangeEvent::Submit)?;

        let mut history = reconstruct(&self.graph, input_id);
        history.push(ChatMessage::user(text));

        let user_y = if pinned {
            origin.y
        } else {
            self.graph
                .parent(input_id)
                .map(stacked_y)
                .unwrap_or(origin.y)
        };

        let user_id = self.ids.next_node_id("user");
        let assistant_id = self.ids.next_node_id("assistant");

        let user_node = Node::message(
            user_id.clone(),
            Position::new(origin.x, user_y),
            MessageData {
                role: Role::User,
                content: text.to_string(),
                is_loading: false,
                pinned,
                is_anchor,
            },
        );
        let assistant_node = Node::message(
            assistant_id.clone(),
            Position::new(origin.x, user_y + DEFAULT_NODE_HEIGHT + NODE_GAP),
            MessageData {
                role: Role::Assistant,
                content: String::new(),
                is_loading: true,
                pinned,
                is_anchor: false,
            },
        );

        self.graph
            .retarget_incoming(input_id, &user_id, TargetHandle::Top);
        self.graph.add_nodes([user_node, assistant_node]);
        self.graph.add_edges([Edge::trunk(
            self.ids.next_edge_id(),
            user_id.clone(),
            assistant_id.clone(),
        )]);
        self.graph.remove_nodes(&[input_id.to_string()]);

        machine.handle_event(ExchangeEvent::Dispatch)?;

        tracing::info!(
            input_id = %input_id,
            user_id = %user_id,
            assistant_id = %assistant_id,
            history_len = history.len(),
            pinned = pinned,
            "Exchange: submission accepted"
        );

        self.exchanges.insert(
            assistant_id.clone(),
            Exchange {
                assistant_id: assistant_id.clone(),
                origin_x: origin.x,
                pinned,
                machine,
            },
        );

        Ok(ExchangeTicket {
            user_id,
            assistant_id,
            history,
            generation: self.generation,
        })
    }

    /// Settle the exchange a ticket was issued for, unless the canvas has
    /// been reset since.
    pub fn settle_ticket(
        &mut self,
        ticket: &ExchangeTicket,
        outcome: std::result::Result<String, ModelError>,
    ) -> Result<Settlement> {
        if ticket.generation != self.generation {
            tracing::warn!(
                assistant_id = %ticket.assistant_id,
                "Exchange: canvas was reset; dropping model outcome"
            );
            return Ok(Settlement::Discarded);
        }
        self.settle_exchange(&ticket.assistant_id, outcome)
    }

    /// Apply the model outcome to the assistant node captured at submission.
    pub fn settle_exchange(
        &mut self,
        assistant_id: &str,
        outcome: std::result::Result<String, ModelError>,
    ) -> Result<Settlement> {
        if !self.graph.contains(assistant_id) {
            tracing::warn!(
                assistant_id = %assistant_id,
                "Exchange: assistant node is gone; dropping model outcome"
            );
            self.exchanges.remove(assistant_id);
            return Ok(Settlement::Discarded);
        }
        let Some(exchange) = self.exchanges.get_mut(assistant_id) else {
            tracing::warn!(assistant_id = %assistant_id, "Exchange: no record for assistant node");
            return Ok(Settlement::Discarded);
        };

        match outcome {
            Ok(text) => {
                exchange.machine.handle_event(ExchangeEvent::ModelResponded)?;
                let pending = PendingInput {
                    parent_id: assistant_id.to_string(),
                    x: exchange.origin_x,
                    pinned: exchange.pinned,
                };

                self.graph.update_node(assistant_id, |node| {
                    if let Some(message) = node.as_message_mut() {
                        message.content = text;
                        message.is_loading = false;
                    }
                });
                self.pending.insert(assistant_id.to_string(), pending);

                tracing::info!(assistant_id = %assistant_id, "Exchange: settled with response");
                Ok(Settlement::Completed)
            }
            Err(err) => {
                let message = err.to_string();
                exchange.machine.handle_event(ExchangeEvent::ModelFailed {
                    message: message.clone(),
                })?;

                self.graph.update_node(assistant_id, |node| {
                    if let Some(data) = node.as_message_mut() {
                        data.content = format!("Error: {}", message);
                        data.is_loading = false;
                    }
                });

                tracing::warn!(
                    assistant_id = %assistant_id,
                    error = %message,
                    "Exchange: settled with error"
                );
                Ok(Settlement::Failed)
            }
        }
    }

    /// Record renderer size measurements, run one-hop layout around each
    /// resized node, then materialize any follow-up input whose parent now
    /// has a known height.
    pub fn apply_measurements(&mut self, changes: &[(NodeId, Size)]) -> MeasureReport {
        for (id, size) in changes {
            let size = *size;
            self.graph.update_node(id, |node| node.measured = Some(size));
        }

        let mut report = MeasureReport::default();
        for (id, _) in changes {
            report.moved.extend(relax_around(&mut self.graph, id));
        }
        report.inserted = self.materialize_pending();
        report
    }

    fn materialize_pending(&mut self) -> Vec<NodeId> {
        let mut ready: Vec<NodeId> = self
            .pending
            .keys()
            .filter(|parent_id| {
                self.graph
                    .node(parent_id)
                    .and_then(Node::known_height)
                    .is_some()
            })
            .cloned()
            .collect();
        ready.sort();

        let mut inserted = Vec::with_capacity(ready.len());
        for parent_id in ready {
            let Some(pending) = self.pending.remove(&parent_id) else {
                continue;
            };
            let Some(y) = self.graph.node(&parent_id).map(stacked_y) else {
                continue;
            };

            let input_id = self.ids.next_node_id("input");
            self.graph.add_nodes([Node::input(
                input_id.clone(),
                Position::new(pending.x, y),
                InputData::new(pending.pinned, false),
            )]);
            self.graph.add_edges([Edge::new(
                self.ids.next_edge_id(),
                parent_id.clone(),
                SourceHandle::Bottom,
                input_id.clone(),
                TargetHandle::Top,
            )]);

            tracing::debug!(parent_id = %parent_id, input_id = %input_id, "Exchange: follow-up input placed");
            inserted.push(input_id);
        }
        inserted
    }

    /// Handle the end of a connection drag. Returns the new input node id
    /// when a branch was spawned, `None` when the drag landed on a handle.
    pub fn connect_end(&mut self, gesture: &ConnectEnd) -> Result<Option<NodeId>> {
        if gesture.is_valid {
            return Ok(None);
        }

        let at = self.viewport.screen_to_flow(gesture.screen_position);
        let handle = gesture.from_handle.unwrap_or_default();
        spawn_branch(&mut self.graph, &mut self.ids, &gesture.from_node, handle, at).map(Some)
    }

    /// Branch directly at flow coordinates, bypassing the viewport.
    pub fn spawn_branch_at(
        &mut self,
        source_id: &str,
        handle: SourceHandle,
        at: Position,
    ) -> Result<NodeId> {
        spawn_branch(&mut self.graph, &mut self.ids, source_id, handle, at)
    }

    /// Cascade-delete the given nodes and everything below them.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> Vec<NodeId> {
        let removed = self.graph.cascade_delete(ids);
        for id in &removed {
            self.pending.remove(id);
            self.exchanges.remove(id);
        }

        if !removed.is_empty() {
            tracing::info!(removed = ?removed, "Canvas: cascade delete");
        }
        removed
    }
}
