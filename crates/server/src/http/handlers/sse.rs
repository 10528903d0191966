use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use crate::state::AppState;

pub async fn sse_handler(
    State(state): State<AppState>,
    Path(upgrade_guide): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let rx = state.service.subscribe();
    tracing::info!("SSE Connected: upgrade_guide={}", upgrade_guide);

    let stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(event) if event.upgrade_guide.as_str() == upgrade_guide => Some(
            Event::default()
                .event(event.sse_name())
                .json_data(&event)
                .map_err(|e| {
                    tracing::error!("SSE serialization error: {}", e);
                    axum::Error::new(e)
                }),
        ),
        Ok(_) => None,
        Err(_lagged) => {
            tracing::warn!("SSE Client lagged for {}", upgrade_guide);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}
