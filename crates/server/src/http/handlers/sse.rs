use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use domain::MorphRef;
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::state::AppState;

/// Streams lifecycle events for one commentable record.
pub async fn sse_handler(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.tx_events.subscribe();
    let target = MorphRef::new(kind, id);
    tracing::info!("SSE connected: {}", target);

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.commentable() == &target => Some(
            Event::default()
                .event(event.name())
                .json_data(event.comment())
                .map_err(|e| {
                    tracing::error!("SSE serialization error: {}", e);
                    axum::Error::new(e)
                }),
        ),
        Ok(_) => None,
        Err(_lagged) => {
            tracing::warn!("SSE client lagged for {}", target);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}
