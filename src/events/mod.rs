use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Events emitted by the services as side effects of platform actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Product lifecycle
    ProductSubmitted(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    ProductStatusChanged {
        product_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Engagement
    UpvoteToggled {
        product_id: Uuid,
        user_id: Uuid,
        upvoted: bool,
    },
    CommentPosted {
        product_id: Uuid,
        comment_id: Uuid,
    },
    ReviewPosted {
        product_id: Uuid,
        review_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Drains the event channel and logs each event. The platform has no external
/// consumers; this task exists so services can emit without blocking and so a
/// real broker can be dropped in later without touching the services.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(?event, "Processing event");
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::ProductSubmitted(Uuid::new_v4()))
            .await
            .expect("send should succeed");

        assert!(matches!(
            rx.recv().await,
            Some(Event::ProductSubmitted(_))
        ));
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::ProductDeleted(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
