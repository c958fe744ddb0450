use crate::state::{AppState, MonitorEventEntry};
use andon_api::watcher::{RefreshKind, WatchCommand};
use andon_core::summary::TicketSummary;
use andon_core::types::Ticket;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct HttpState {
    pub app: AppState,
    pub commands: mpsc::UnboundedSender<WatchCommand>,
}

#[derive(Deserialize)]
struct EventsQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HealthResponse {
    alarm: &'static str,
    open: usize,
    process: usize,
    closed: usize,
    total: usize,
    refreshing: bool,
    last_fetch_at: Option<String>,
    last_error: Option<String>,
    uptime_seconds: u64,
}

#[derive(Serialize)]
struct TicketsResponse {
    query: QueryEcho,
    tickets: Vec<Ticket>,
}

#[derive(Serialize)]
struct QueryEcho {
    start_date: String,
    end_date: String,
    status: String,
}

#[derive(Serialize)]
struct EventsResponse {
    events: Vec<MonitorEventEntry>,
}

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/tickets", get(tickets_handler))
        .route("/summary", get(summary_handler))
        .route("/events", get(events_handler))
        .route("/refresh", post(refresh_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let summary = state.app.summary().await;
    let total = state.app.tickets().await.len();
    Json(HealthResponse {
        alarm: state.app.alarm_state().as_str(),
        open: summary.open,
        process: summary.process,
        closed: summary.closed,
        total,
        refreshing: state.app.is_refreshing(),
        last_fetch_at: state.app.last_fetch_at().await.map(|ts| ts.to_rfc3339()),
        last_error: state.app.last_error().await,
        uptime_seconds: state.app.uptime_seconds(),
    })
}

async fn tickets_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let query = state.app.query().await;
    Json(TicketsResponse {
        query: QueryEcho {
            start_date: query.start_date.format("%Y-%m-%d").to_string(),
            end_date: query.end_date.format("%Y-%m-%d").to_string(),
            status: query.status,
        },
        tickets: state.app.tickets().await,
    })
}

async fn summary_handler(State(state): State<HttpState>) -> Json<TicketSummary> {
    Json(state.app.summary().await)
}

async fn events_handler(
    State(state): State<HttpState>,
    Query(params): Query<EventsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(50);
    Json(EventsResponse {
        events: state.app.get_events(limit).await,
    })
}

async fn refresh_handler(State(state): State<HttpState>) -> impl IntoResponse {
    if state
        .commands
        .send(WatchCommand::Refresh(RefreshKind::Manual))
        .is_err()
    {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": "watcher is not running" })),
        )
            .into_response();
    }
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "status": "refresh requested" })),
    )
        .into_response()
}
