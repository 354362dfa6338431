use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the ledger after a transaction commits. Events
/// are informational; a failed send is logged and never surfaced to the
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderCreated(Uuid),
    StockGranted {
        salesperson_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    StockDebited {
        salesperson_id: Uuid,
        order_id: Uuid,
        line_count: usize,
    },
    StockRemoved {
        salesperson_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    LowStock {
        salesperson_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        threshold: i32,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget send used after commit, where a full channel must not
    /// fail the already-committed operation.
    pub async fn send_logged(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Failed to publish domain event");
        }
    }
}

/// Consumes events from the channel and logs them. External subscribers
/// (KPI aggregation, notifications) hang off this loop in deployments.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::OrderCreated(order_id) => {
                info!(order_id = %order_id, "event: order created");
            }
            Event::StockDebited {
                salesperson_id,
                order_id,
                line_count,
            } => {
                info!(
                    salesperson_id = %salesperson_id,
                    order_id = %order_id,
                    line_count,
                    "event: stock debited"
                );
            }
            Event::LowStock {
                salesperson_id,
                product_id,
                quantity,
                threshold,
            } => {
                warn!(
                    salesperson_id = %salesperson_id,
                    product_id = %product_id,
                    quantity,
                    threshold,
                    "event: low stock"
                );
            }
            other => {
                info!(event = ?other, "event");
            }
        }
    }
}
