//! Exchange orchestrator
//!
//! Runs a submission end to end: mutate the canvas, release the lock while
//! the model call is in flight, then re-acquire it to apply the outcome.
//! Several exchanges can be outstanding at once; each one only ever writes
//! to the assistant node captured in its ticket.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::canvas::Canvas;
use crate::error::Result;
use crate::exchange::{ExchangeTicket, Settlement};
use crate::model::ModelClient;

#[derive(Clone)]
pub struct Orchestrator {
    canvas: Arc<Mutex<Canvas>>,
    client: Arc<dyn ModelClient>,
}

impl Orchestrator {
    pub fn new(canvas: Arc<Mutex<Canvas>>, client: Arc<dyn ModelClient>) -> Self {
        Self { canvas, client }
    }

    pub fn canvas(&self) -> Arc<Mutex<Canvas>> {
        Arc::clone(&self.canvas)
    }

    /// Submit `text` from `input_id` and wait for the exchange to settle.
    pub async fn submit(&self, input_id: &str, text: &str) -> Result<Settlement> {
        let ticket = {
            let mut canvas = self.canvas.lock().await;
            canvas.begin_exchange(input_id, text)?
        };
        self.complete(ticket).await
    }

    /// Submit the draft already typed into `input_id`.
    pub async fn submit_draft(&self, input_id: &str) -> Result<Settlement> {
        let ticket = {
            let mut canvas = self.canvas.lock().await;
            canvas.submit_draft(input_id)?
        };
        self.complete(ticket).await
    }

    /// The model call runs without the canvas lock held.
    async fn complete(&self, ticket: ExchangeTicket) -> Result<Settlement> {
        let outcome = self.client.send_messages(&ticket.history).await;
        if let Err(e) = &outcome {
            tracing::error!(
                assistant_id = %ticket.assistant_id,
                error = ?e,
                "Orchestrator: model call failed"
            );
        }

        let mut canvas = self.canvas.lock().await;
        canvas.settle_ticket(&ticket, outcome)
    }

    /// Fire-and-forget submission on the tokio runtime.
    pub fn spawn_submit(&self, input_id: String, text: String) -> JoinHandle<Result<Settlement>> {
        let this = self.clone();
        tokio::spawn(async move { this.submit(&input_id, &text).await })
    }
}
