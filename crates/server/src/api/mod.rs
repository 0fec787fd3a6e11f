use std::sync::Arc;

use binder::DashboardSession;
use serde::Deserialize;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlDomain, ControlEvent, DashboardEvent, DashboardSnapshot},
};
use tokio::sync::{broadcast, Mutex};

/// The single dashboard session; interactions are serialized by the lock.
#[derive(Clone)]
pub struct ApiContext {
    pub session: Arc<Mutex<DashboardSession>>,
}

impl ApiContext {
    pub fn new(session: DashboardSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Either one control event or a batch applied atomically.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EventsBody {
    One(ControlEvent),
    Batch(Vec<ControlEvent>),
}

impl EventsBody {
    pub fn into_events(self) -> Vec<ControlEvent> {
        match self {
            EventsBody::One(event) => vec![event],
            EventsBody::Batch(events) => events,
        }
    }
}

pub fn events_route() -> &'static str {
    "/api/events"
}

pub async fn control_domain(ctx: &ApiContext) -> ControlDomain {
    ctx.session.lock().await.control_domain()
}

pub async fn snapshot(ctx: &ApiContext) -> DashboardSnapshot {
    ctx.session.lock().await.snapshot()
}

/// Applies a batch and pushes the refreshed views to subscribers before the
/// session lock is released, so push order follows apply order.
pub async fn apply_events(
    ctx: &ApiContext,
    events: Vec<ControlEvent>,
    push: &broadcast::Sender<DashboardEvent>,
) -> Result<DashboardEvent, ApiError> {
    if events.is_empty() {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "at least one control event is required",
        ));
    }

    let mut session = ctx.session.lock().await;
    let views = session.apply_batch(&events)?;
    let changed = !views.is_empty();
    let event = DashboardEvent::ViewsRefreshed {
        controls: session.controls(),
        views,
    };
    if changed {
        let _ = push.send(event.clone());
    }
    Ok(event)
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
