// Server-sent event stream of form snapshots
use crate::application::form_service::FormSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// One `snapshot` event for the current revision, then one per new revision.
/// Revisions published faster than the client reads are coalesced.
pub fn snapshot_stream(
    mut rx: watch::Receiver<Arc<FormSnapshot>>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            match Event::default()
                .event("snapshot")
                .id(snapshot.revision.to_string())
                .json_data(&*snapshot)
            {
                Ok(event) => {
                    yield Ok::<_, Infallible>(event);
                }
                Err(e) => tracing::warn!("Failed to serialize snapshot {}: {}", snapshot.revision, e),
            }

            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

pub fn sse_from_receiver(
    rx: watch::Receiver<Arc<FormSnapshot>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(snapshot_stream(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
