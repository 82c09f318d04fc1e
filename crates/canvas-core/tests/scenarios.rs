//! End-to-end canvas scenarios driven through the orchestrator with a
//! scripted model client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::sync::Mutex;

use canvas_core::{
    Canvas, CanvasError, ChatMessage, ConnectEnd, ModelClient, ModelError, NodeId, Orchestrator,
    Position, Role, Settlement, Size, SourceHandle, WELCOME_NODE_ID,
};

/// Replays queued outcomes and records every transcript it was sent.
#[derive(Default)]
struct ScriptedClient {
    replies: StdMutex<VecDeque<Result<String, ModelError>>>,
    calls: StdMutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    fn with_replies(replies: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: StdMutex::new(replies.into()),
            calls: StdMutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn send_messages(&self, messages: &[ChatMessage]) -> Result<String, ModelError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::InvalidResponse))
    }
}

fn setup(replies: Vec<Result<String, ModelError>>) -> (Orchestrator, Arc<ScriptedClient>) {
    let client = ScriptedClient::with_replies(replies);
    let canvas = Arc::new(Mutex::new(Canvas::new()));
    (Orchestrator::new(canvas, client.clone()), client)
}

fn inputs(canvas: &Canvas) -> Vec<NodeId> {
    canvas
        .graph()
        .nodes()
        .iter()
        .filter(|n| n.is_input())
        .map(|n| n.id.clone())
        .collect()
}

fn messages_with_role(canvas: &Canvas, role: Role) -> Vec<NodeId> {
    canvas
        .graph()
        .nodes()
        .iter()
        .filter(|n| n.as_message().map(|m| m.role) == Some(role))
        .map(|n| n.id.clone())
        .collect()
}

#[test]
fn initialize_seeds_welcome_and_input() {
    let canvas = Canvas::new();
    let graph = canvas.graph();

    assert_eq!(graph.nodes().len(), 2);
    assert_eq!(graph.edges().len(), 1);

    let welcome = graph.node(WELCOME_NODE_ID).unwrap().as_message().unwrap();
    assert_eq!(welcome.role, Role::Assistant);

    let input_id = inputs(&canvas).pop().unwrap();
    assert_eq!(graph.edges()[0].source, WELCOME_NODE_ID);
    assert_eq!(graph.edges()[0].target, input_id);
}

#[test]
fn submit_replaces_input_with_message_pair() {
    let mut canvas = Canvas::new();
    let input_id = inputs(&canvas).pop().unwrap();
    let original_edge = canvas.graph().edges()[0].id.clone();

    let ticket = canvas.begin_exchange(&input_id, "Hi").unwrap();
    let graph = canvas.graph();

    assert!(!graph.contains(&input_id));
    let user = graph.node(&ticket.user_id).unwrap().as_message().unwrap();
    assert_eq!(user.role, Role::User);
    assert_eq!(user.content, "Hi");

    let assistant = graph.node(&ticket.assistant_id).unwrap().as_message().unwrap();
    assert!(assistant.is_loading);
    assert!(assistant.content.is_empty());

    let rewired = graph.edges().iter().find(|e| e.id == original_edge).unwrap();
    assert_eq!(rewired.source, WELCOME_NODE_ID);
    assert_eq!(rewired.target, ticket.user_id);
    assert_eq!(graph.parent_edge(&ticket.assistant_id).unwrap().source, ticket.user_id);
    assert_eq!(graph.edges().len(), 2);

    assert_eq!(
        ticket.history,
        vec![
            ChatMessage::assistant(canvas_core::WELCOME_MESSAGE),
            ChatMessage::user("Hi"),
        ]
    );
}

#[tokio::test]
async fn successful_reply_adds_follow_up_after_measurement() {
    let (orchestrator, _client) = setup(vec![Ok("Hello there".to_string())]);
    let canvas = orchestrator.canvas();
    let input_id = inputs(&*canvas.lock().await).pop().unwrap();

    let settlement = orchestrator.submit(&input_id, "Hi").await.unwrap();
    assert_eq!(settlement, Settlement::Completed);

    let mut canvas = canvas.lock().await;
    let assistant_id = messages_with_role(&canvas, Role::Assistant)
        .into_iter()
        .find(|id| id != WELCOME_NODE_ID)
        .unwrap();
    let assistant = canvas.graph().node(&assistant_id).unwrap().as_message().unwrap();
    assert_eq!(assistant.content, "Hello there");
    assert!(!assistant.is_loading);

    // Nothing is inserted until the assistant's height is known.
    assert!(inputs(&canvas).is_empty());

    let report = canvas.apply_measurements(&[(assistant_id.clone(), Size::new(320.0, 96.0))]);
    assert_eq!(report.inserted.len(), 1);

    let follow_up = canvas.graph().node(&report.inserted[0]).unwrap();
    assert!(follow_up.is_input());
    assert_eq!(
        canvas.graph().parent_edge(&follow_up.id).unwrap().source,
        assistant_id
    );
    let assistant_node = canvas.graph().node(&assistant_id).unwrap();
    assert_eq!(
        follow_up.position.y,
        assistant_node.position.y + 96.0 + canvas_core::NODE_GAP
    );
}

#[tokio::test]
async fn failed_reply_marks_error_and_dead_ends() {
    let (orchestrator, _client) = setup(vec![Err(ModelError::from_status(
        429,
        Some("rate limited".to_string()),
    ))]);
    let canvas = orchestrator.canvas();
    let input_id = inputs(&*canvas.lock().await).pop().unwrap();

    let settlement = orchestrator.submit(&input_id, "Hi").await.unwrap();
    assert_eq!(settlement, Settlement::Failed);

    let mut canvas = canvas.lock().await;
    let assistant_id = messages_with_role(&canvas, Role::Assistant)
        .into_iter()
        .find(|id| id != WELCOME_NODE_ID)
        .unwrap();
    let assistant = canvas.graph().node(&assistant_id).unwrap().as_message().unwrap();
    assert_eq!(assistant.content, "Error: rate limited");
    assert!(!assistant.is_loading);

    let report = canvas.apply_measurements(&[(assistant_id, Size::new(320.0, 60.0))]);
    assert!(report.inserted.is_empty());
    assert!(inputs(&canvas).is_empty());
}

#[tokio::test]
async fn branch_history_excludes_sibling_threads() {
    let (orchestrator, client) = setup(vec![
        Ok("Nice to meet you, Ada".to_string()),
        Ok("Rust is great".to_string()),
        Ok("Side answer".to_string()),
    ]);
    let canvas = orchestrator.canvas();
    let first_input = inputs(&*canvas.lock().await).pop().unwrap();

    orchestrator.submit(&first_input, "I'm Ada").await.unwrap();
    let first_assistant = {
        let mut canvas = canvas.lock().await;
        let id = canvas.graph().leaves()[0].id.clone();
        canvas.apply_measurements(&[(id.clone(), Size::new(300.0, 80.0))]);
        id
    };

    // Continue the trunk so there is a sibling thread below the branch point.
    let trunk_input = canvas.lock().await.graph().children_ids(&first_assistant)[0].clone();
    orchestrator.submit(&trunk_input, "Tell me about Rust").await.unwrap();

    let branch_input = {
        let mut canvas = canvas.lock().await;
        canvas
            .connect_end(&ConnectEnd {
                from_node: first_assistant.clone(),
                from_handle: Some(SourceHandle::Right),
                is_valid: false,
                screen_position: Position::new(400.0, 400.0),
            })
            .unwrap()
            .unwrap()
    };
    {
        let canvas = canvas.lock().await;
        let node = canvas.graph().node(&branch_input).unwrap();
        assert_eq!(node.position, Position::new(400.0, 400.0));
        assert!(node.is_pinned());
        assert!(node.is_anchor());
    }

    orchestrator.submit(&branch_input, "Side question").await.unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[2],
        vec![
            ChatMessage::assistant(canvas_core::WELCOME_MESSAGE),
            ChatMessage::user("I'm Ada"),
            ChatMessage::assistant("Nice to meet you, Ada"),
            ChatMessage::user("Side question"),
        ]
    );
}

#[tokio::test]
async fn deleting_user_node_removes_its_subtree() {
    let (orchestrator, _client) = setup(vec![Ok("Hello".to_string())]);
    let canvas = orchestrator.canvas();
    let input_id = inputs(&*canvas.lock().await).pop().unwrap();
    orchestrator.submit(&input_id, "Hi").await.unwrap();

    let mut canvas = canvas.lock().await;
    let user_id = messages_with_role(&canvas, Role::User).pop().unwrap();
    let assistant_id = canvas.graph().children_ids(&user_id)[0].clone();
    let report = canvas.apply_measurements(&[(assistant_id.clone(), Size::new(300.0, 80.0))]);
    let follow_up = report.inserted[0].clone();

    let removed = canvas.delete_nodes(&[user_id.clone()]);
    assert_eq!(removed.len(), 3);
    for id in [&user_id, &assistant_id, &follow_up] {
        assert!(!canvas.graph().contains(id));
    }
    assert!(canvas
        .graph()
        .edges()
        .iter()
        .all(|e| canvas.graph().contains(&e.source) && canvas.graph().contains(&e.target)));
    assert_eq!(canvas.graph().nodes().len(), 1);

    // A second delete of the same ids is a no-op.
    assert!(canvas.delete_nodes(&[user_id]).is_empty());
}

#[tokio::test]
async fn blank_submission_never_reaches_the_model() {
    let (orchestrator, client) = setup(vec![]);
    let canvas = orchestrator.canvas();
    let input_id = inputs(&*canvas.lock().await).pop().unwrap();
    let before = canvas.lock().await.graph().clone();

    for text in ["", "   ", "\n\t"] {
        let err = orchestrator.submit(&input_id, text).await.unwrap_err();
        assert_eq!(err, CanvasError::EmptyMessage);
    }

    assert!(client.calls().is_empty());
    assert_eq!(canvas.lock().await.graph(), &before);
}

#[tokio::test]
async fn anchors_stay_put_when_parents_resize() {
    let (orchestrator, _client) = setup(vec![Ok("Branch reply".to_string())]);
    let canvas = orchestrator.canvas();

    let branch_input = canvas
        .lock()
        .await
        .spawn_branch_at(WELCOME_NODE_ID, SourceHandle::Left, Position::new(-250.0, 400.0))
        .unwrap();
    orchestrator.submit(&branch_input, "Hi from the side").await.unwrap();

    let mut canvas = canvas.lock().await;
    let anchor_id = messages_with_role(&canvas, Role::User).pop().unwrap();
    let anchor_before = canvas.graph().node(&anchor_id).unwrap().position;

    canvas.apply_measurements(&[
        (WELCOME_NODE_ID.to_string(), Size::new(500.0, 400.0)),
        (anchor_id.clone(), Size::new(280.0, 70.0)),
    ]);
    assert_eq!(canvas.graph().node(&anchor_id).unwrap().position, anchor_before);

    // The anchor's child is still stacked below it.
    let assistant_id = canvas.graph().children_ids(&anchor_id)[0].clone();
    assert_eq!(
        canvas.graph().node(&assistant_id).unwrap().position.y,
        anchor_before.y + 70.0 + canvas_core::NODE_GAP
    );
}

#[tokio::test]
async fn concurrent_exchanges_each_get_a_follow_up() {
    let (orchestrator, _client) = setup(vec![Ok("one".to_string()), Ok("two".to_string())]);
    let canvas = orchestrator.canvas();

    let trunk_input = inputs(&*canvas.lock().await).pop().unwrap();
    let side_input = canvas
        .lock()
        .await
        .spawn_branch_at(WELCOME_NODE_ID, SourceHandle::Right, Position::new(600.0, 300.0))
        .unwrap();

    let a = orchestrator.spawn_submit(trunk_input, "first".to_string());
    let b = orchestrator.spawn_submit(side_input, "second".to_string());
    assert_eq!(a.await.unwrap().unwrap(), Settlement::Completed);
    assert_eq!(b.await.unwrap().unwrap(), Settlement::Completed);

    let mut canvas = canvas.lock().await;
    let assistants: Vec<(NodeId, Size)> = messages_with_role(&canvas, Role::Assistant)
        .into_iter()
        .filter(|id| id != WELCOME_NODE_ID)
        .map(|id| (id, Size::new(300.0, 90.0)))
        .collect();
    assert_eq!(assistants.len(), 2);

    let report = canvas.apply_measurements(&assistants);
    assert_eq!(report.inserted.len(), 2);
}
