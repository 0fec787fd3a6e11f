use std::{net::SocketAddr, sync::Arc};

use aggregation::AggregationEngine;
use anyhow::Context;
use axum::{
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use binder::DashboardSession;
use dataset::Dataset;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlDomain, DashboardEvent, DashboardSnapshot},
};
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{apply_events, control_domain, events_route, snapshot, ApiContext, EventsBody};
use app_state::AppState;
use config::{load_settings, resolve_dataset_path};

const MAX_EVENT_BODY_BYTES: usize = 16 * 1024;
const INDEX_HTML: &str = include_str!("../static/index.html");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let dataset_path = resolve_dataset_path(&settings.dataset_path)?;
    let dataset = Dataset::load(&dataset_path)
        .map_err(|error| {
            error!(
                path = %dataset_path.display(),
                %error,
                "failed to load booking dataset; refusing to serve without data"
            );
            error
        })
        .with_context(|| format!("loading dataset '{}'", dataset_path.display()))?;

    let session = DashboardSession::new(AggregationEngine::new(dataset), settings.default_year);
    let (events, _) = broadcast::channel(settings.broadcast_capacity);
    let state = AppState {
        api: ApiContext::new(session),
        events,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "dashboard listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(healthz))
        .route("/api/controls", get(http_controls))
        .route("/api/views", get(http_views))
        .route(
            events_route(),
            post(http_apply_events).layer(RequestBodyLimitLayer::new(MAX_EVENT_BODY_BYTES)),
        )
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn http_controls(State(state): State<Arc<AppState>>) -> Json<ControlDomain> {
    Json(control_domain(&state.api).await)
}

async fn http_views(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(snapshot(&state.api).await)
}

async fn http_apply_events(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EventsBody>,
) -> Result<Json<DashboardEvent>, (StatusCode, Json<ApiError>)> {
    let event = apply_events(&state.api, body.into_events(), &state.events)
        .await
        .map_err(|e| {
            let status = match e.code {
                ErrorCode::Validation => StatusCode::BAD_REQUEST,
                ErrorCode::NotFound => StatusCode::NOT_FOUND,
                ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(e))
        })?;
    Ok(Json(event))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let mut events_rx = state.events.subscribe();

    let current = snapshot(&state.api).await;
    let initial = DashboardEvent::ViewsRefreshed {
        controls: current.controls,
        views: current.views,
    };

    let send_task = tokio::spawn(async move {
        if let Ok(text) = serde_json::to_string(&initial) {
            if sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        loop {
            let event = match events_rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "websocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let text = match serde_json::to_string(&event) {
                Ok(v) => v,
                Err(_) => continue,
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
