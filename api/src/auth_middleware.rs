use std::sync::Arc;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;

use crate::auth::AuthManager;
use crate::chain::{Flow, RequestContext};
use crate::error::{ApiError, ApiResult};

/// Authentication collaborator run in front of every protected route.
///
/// Implementations either return `Flow::Continue`, answer the request
/// themselves with `Flow::Halt`, or signal an error for central translation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow>;
}

/// Identity of the caller, inserted into the request extensions.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub subject: String,
}

pub struct JwtAuthenticator {
    manager: Arc<AuthManager>,
}

impl JwtAuthenticator {
    pub fn new(manager: Arc<AuthManager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow> {
        let token = ctx
            .header(AUTHORIZATION.as_str())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let Some(token) = token else {
            return Err(ApiError::unauthorized("missing_bearer_token"));
        };

        let claims = self.manager.validate_token(token).map_err(|err| {
            tracing::debug!(path = %ctx.path, error = %err, "bearer token rejected");
            ApiError::unauthorized(err.to_string())
        })?;

        ctx.extensions.insert(AuthContext {
            subject: claims.sub,
        });
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use chrono::Duration;

    fn authenticator() -> (JwtAuthenticator, Arc<AuthManager>) {
        let manager = Arc::new(AuthManager::new("test-secret", Duration::hours(1)));
        (JwtAuthenticator::new(Arc::clone(&manager)), manager)
    }

    fn ctx_with_auth(value: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(value) = value {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        RequestContext::new(Method::GET, "/things").with_headers(headers)
    }

    #[tokio::test]
    async fn valid_token_continues_and_sets_context() {
        let (auth, manager) = authenticator();
        let token = manager.issue_token("ada").unwrap();
        let mut ctx = ctx_with_auth(Some(&format!("Bearer {}", token)));

        let flow = auth.handle(&mut ctx).await.unwrap();
        assert!(matches!(flow, Flow::Continue));
        assert_eq!(ctx.extensions.get::<AuthContext>().unwrap().subject, "ada");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let (auth, _) = authenticator();
        for header in [None, Some("Basic abc"), Some("Bearer ")] {
            let err = auth.handle(&mut ctx_with_auth(header)).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let (auth, _) = authenticator();
        let err = auth
            .handle(&mut ctx_with_auth(Some("Bearer not.a.jwt")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
