use domain::CommentEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Where the service drops lifecycle events once a transaction commits.
/// Delivery is fire-and-forget.
pub trait EventSink: Send + Sync {
    fn dispatch(&self, event: CommentEvent);
}

impl EventSink for broadcast::Sender<CommentEvent> {
    fn dispatch(&self, event: CommentEvent) {
        let name = event.name();
        if self.send(event).is_err() {
            debug!("No subscribers for {}", name);
        }
    }
}
