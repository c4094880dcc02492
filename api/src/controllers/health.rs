use std::time::Instant;

use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::chain::RequestContext;
use crate::controller::{BaseController, Controller};
use crate::error::{ApiResult, ConfigError};
use crate::state::AppState;

/// Liveness probe, reachable without a token.
pub struct HealthController {
    base: BaseController,
    started_at: Instant,
}

impl HealthController {
    pub const PATH: &'static str = "/health";

    pub fn new(state: &AppState) -> Result<Self, ConfigError> {
        Ok(Self {
            base: BaseController::without_auth(Self::PATH)?,
            started_at: state.started_at,
        })
    }
}

async fn health_check(started_at: Instant, _ctx: RequestContext) -> ApiResult<Response> {
    let uptime = started_at.elapsed().as_secs();
    Ok(Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": uptime
    }))
    .into_response())
}

impl Controller for HealthController {
    fn base(&self) -> &BaseController {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseController {
        &mut self.base
    }

    fn initialize_routes(&mut self) {
        let started_at = self.started_at;
        self.base.get("", vec![], move |ctx: RequestContext| {
            health_check(started_at, ctx)
        });
    }
}
