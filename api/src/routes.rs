use axum::http::{header, Method};
use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::controller::Controller;
use crate::controllers::{ContactsController, HealthController};
use crate::error::{ApiError, ConfigError};
use crate::observability::request_logger;
use crate::state::AppState;

/// Assemble every controller behind the shared middleware stack.
pub fn build_router(state: &AppState) -> Result<Router, ConfigError> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = Router::new()
        .merge(HealthController::new(state)?.into_router()?)
        .merge(ContactsController::new(state)?.into_router()?)
        .fallback(route_not_found)
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Ok(app)
}

pub async fn route_not_found() -> ApiError {
    ApiError::not_found("RouteNotFound", "The requested endpoint does not exist")
}
