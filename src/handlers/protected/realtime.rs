use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::middleware::Viewer;
use crate::realtime::EventFilter;
use crate::state::AppState;
use crate::team::{fetch_manager_team_members, fetch_nested_team_members};

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    pub tables: Option<String>,
}

/// GET /api/realtime?tables=team_bulletins,daily_metrics - server-sent events
///
/// Viewers see changes to their own rows, their teams, and their reports.
pub async fn realtime_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<RealtimeQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let team_ids = match state.teams().team_ids_for_user(viewer.id()).await {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            warn!(user_id = %viewer.id(), error = %e, "Realtime team lookup failed");
            Default::default()
        }
    };

    let directory = state.directory.as_ref();
    let report_ids = fetch_manager_team_members(directory, viewer.id())
        .await
        .into_iter()
        .chain(fetch_nested_team_members(directory, viewer.id()).await)
        .map(|p| p.id)
        .collect();

    let filter = EventFilter {
        tables: EventFilter::parse_tables(query.tables.as_deref()),
        viewer_id: viewer.id(),
        team_ids,
        report_ids,
        unrestricted: viewer.is_admin(),
    };

    info!(user_id = %viewer.id(), tables = ?filter.tables, "Realtime client connected");

    let stream = BroadcastStream::new(state.feed.subscribe()).filter_map(move |result| {
        // Lagged receivers skip what they missed.
        let event = result.ok()?;
        if !filter.accepts(&event) {
            return None;
        }
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(event.table.as_str()).data(json)))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("keep-alive"))
}
