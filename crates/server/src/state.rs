use axum::extract::FromRef;
use comments::CommentService;
use domain::CommentEvent;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CommentService>,
    pub tx_events: broadcast::Sender<CommentEvent>,
}

impl FromRef<AppState> for Arc<CommentService> {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}
