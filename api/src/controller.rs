//! Route groups and the base every concrete controller builds on.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, Method, Uri},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};

use crate::auth_middleware::Authenticator;
use crate::chain::{
    BoxedHandler, BoxedStep, Chain, Flow, GroupStep, RequestContext, RouteHandler, Step,
};
use crate::error::{ApiResult, ConfigError};
use crate::validation::{validators::is_boolean_string, ValidationHandler};

/// Path pattern for steps that apply to a whole subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches the path itself.
    Exact(String),
    /// `"/prefix/*"`: any path nested below the prefix, at any depth.
    Wildcard(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/*") {
            Some(prefix) => PathPattern::Wildcard(prefix.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(p) => path == p || path.strip_suffix('/') == Some(p.as_str()),
            PathPattern::Wildcard(prefix) => path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty()),
        }
    }
}

struct Route {
    method: Method,
    path: String,
    steps: Vec<BoxedStep>,
    handler: BoxedHandler,
}

/// All handling steps registered under one path prefix.
pub struct RouteGroup {
    prefix: String,
    group_steps: Vec<GroupStep>,
    routes: Vec<Route>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Result<Self, ConfigError> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(ConfigError::EmptyRoutePath);
        }
        Ok(Self {
            prefix,
            group_steps: Vec::new(),
            routes: Vec::new(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a step for every method on paths matching `pattern`.
    pub fn all(&mut self, pattern: &str, step: BoxedStep) -> &mut Self {
        self.group_steps.push(GroupStep {
            pattern: PathPattern::parse(pattern),
            step,
        });
        self
    }

    /// Register a route. `sub_path` is appended to the prefix and uses axum's
    /// `:param` syntax.
    pub fn route(
        &mut self,
        method: Method,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.routes.push(Route {
            method,
            path: format!("{}{}", self.prefix, sub_path),
            steps,
            handler: Arc::new(handler),
        });
        self
    }

    pub fn patterns(&self) -> Vec<PathPattern> {
        self.group_steps.iter().map(|g| g.pattern.clone()).collect()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn router(&self) -> Result<Router, ConfigError> {
        let group = Arc::new(self.group_steps.clone());
        let mut by_path: BTreeMap<&str, MethodRouter> = BTreeMap::new();

        for route in &self.routes {
            let filter = MethodFilter::try_from(route.method.clone()).map_err(|_| {
                ConfigError::InvalidConfig(format!(
                    "unsupported method {} on {}",
                    route.method, route.path
                ))
            })?;
            let chain = Chain::new(Arc::clone(&group), route.steps.clone(), Arc::clone(&route.handler));
            let endpoint = move |method: Method,
                                 uri: Uri,
                                 headers: HeaderMap,
                                 params: Option<Path<HashMap<String, String>>>,
                                 query: Option<Query<HashMap<String, String>>>,
                                 body: Bytes| {
                let chain = chain.clone();
                async move {
                    let ctx = RequestContext::new(method, uri.path())
                        .with_headers(headers)
                        .with_params(params.map(|Path(p)| p).unwrap_or_default())
                        .with_query(query.map(|Query(q)| q).unwrap_or_default())
                        .with_raw_body(&body);
                    chain.run(ctx).await
                }
            };

            let method_router = match by_path.remove(route.path.as_str()) {
                Some(existing) => existing.on(filter, endpoint),
                None => on(filter, endpoint),
            };
            by_path.insert(route.path.as_str(), method_router);
        }

        Ok(by_path
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(path, method_router)
            }))
    }
}

struct AuthStep {
    authenticator: Arc<dyn Authenticator>,
}

#[async_trait]
impl Step for AuthStep {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow> {
        self.authenticator.handle(ctx).await
    }
}

/// Owns a route group and wires authentication in front of every route.
pub struct BaseController {
    group: RouteGroup,
    validator: ValidationHandler,
}

impl BaseController {
    /// Every request to `path` or anything below it passes through
    /// `authenticator` before reaching a route's own steps.
    pub fn new(
        path: impl Into<String>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self, ConfigError> {
        let mut base = Self::without_auth(path)?;
        let step: BoxedStep = Arc::new(AuthStep { authenticator });
        let prefix = base.group.prefix().to_string();
        base.group
            .all(&prefix, Arc::clone(&step))
            .all(&format!("{}/*", prefix), step);
        Ok(base)
    }

    pub fn without_auth(path: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            group: RouteGroup::new(path)?,
            validator: ValidationHandler::new(),
        })
    }

    pub fn path(&self) -> &str {
        self.group.prefix()
    }

    pub fn group(&self) -> &RouteGroup {
        &self.group
    }

    pub fn validator(&self) -> &ValidationHandler {
        &self.validator
    }

    pub fn get(
        &mut self,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.group.route(Method::GET, sub_path, steps, handler);
        self
    }

    pub fn post(
        &mut self,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.group.route(Method::POST, sub_path, steps, handler);
        self
    }

    pub fn put(
        &mut self,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.group.route(Method::PUT, sub_path, steps, handler);
        self
    }

    pub fn patch(
        &mut self,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.group.route(Method::PATCH, sub_path, steps, handler);
        self
    }

    pub fn delete(
        &mut self,
        sub_path: &str,
        steps: Vec<BoxedStep>,
        handler: impl RouteHandler + 'static,
    ) -> &mut Self {
        self.group.route(Method::DELETE, sub_path, steps, handler);
        self
    }

    /// Lenient boolean query parsing: absent or unrecognized values are
    /// `false`, `"true"` (any case) and `"1"` are `true`.
    pub fn get_bool_from_query(ctx: &RequestContext, name: &str) -> bool {
        let value = ctx.query_value(name).unwrap_or("false");
        is_boolean_string(value) && (value.eq_ignore_ascii_case("true") || value == "1")
    }
}

pub trait Controller: Sized {
    fn base(&self) -> &BaseController;

    fn base_mut(&mut self) -> &mut BaseController;

    fn initialize_routes(&mut self);

    fn into_router(mut self) -> Result<Router, ConfigError> {
        self.initialize_routes();
        let base = self.base();
        tracing::debug!(
            path = base.path(),
            routes = base.group().route_count(),
            "controller mounted"
        );
        base.group().router()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use axum::response::{IntoResponse, Response};
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    struct DenyAll;

    #[async_trait]
    impl Authenticator for DenyAll {
        async fn handle(&self, _ctx: &mut RequestContext) -> ApiResult<Flow> {
            Err(ApiError::unauthorized("denied"))
        }
    }

    fn ok(status: StatusCode) -> ApiResult<Response> {
        Ok(status.into_response())
    }

    fn query(pairs: &[(&str, &str)]) -> RequestContext {
        RequestContext::new(Method::GET, "/").with_query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn empty_or_blank_path_is_rejected() {
        assert!(matches!(RouteGroup::new(""), Err(ConfigError::EmptyRoutePath)));
        assert!(matches!(RouteGroup::new("   "), Err(ConfigError::EmptyRoutePath)));
        assert!(matches!(
            BaseController::without_auth("\t"),
            Err(ConfigError::EmptyRoutePath)
        ));
        assert!(BaseController::new("", Arc::new(DenyAll)).is_err());
        assert!(RouteGroup::new("/things").is_ok());
    }

    #[test]
    fn auth_registered_for_prefix_and_wildcard() {
        let base = BaseController::new("/things", Arc::new(DenyAll)).unwrap();
        assert_eq!(
            base.group().patterns(),
            vec![
                PathPattern::Exact("/things".to_string()),
                PathPattern::Wildcard("/things".to_string()),
            ]
        );

        let open = BaseController::without_auth("/things").unwrap();
        assert!(open.group().patterns().is_empty());
    }

    #[test]
    fn pattern_matching() {
        let exact = PathPattern::parse("/things");
        assert!(exact.matches("/things"));
        assert!(exact.matches("/things/"));
        assert!(!exact.matches("/things/1"));
        assert!(!exact.matches("/thingsx"));

        let wildcard = PathPattern::parse("/things/*");
        assert!(wildcard.matches("/things/1"));
        assert!(wildcard.matches("/things/1/parts/2"));
        assert!(!wildcard.matches("/things"));
        assert!(!wildcard.matches("/things/"));
        assert!(!wildcard.matches("/thingsx/1"));
    }

    #[test]
    fn bool_query_truth_table() {
        let cases = [
            ("true", true),
            ("TRUE", true),
            ("True", true),
            ("1", true),
            ("false", false),
            ("0", false),
            ("yes", false),
            ("", false),
        ];
        for (raw, expected) in cases {
            assert_eq!(
                BaseController::get_bool_from_query(&query(&[("flag", raw)]), "flag"),
                expected,
                "value {raw:?}"
            );
        }
        assert!(!BaseController::get_bool_from_query(&query(&[]), "flag"));
    }

    #[tokio::test]
    async fn auth_runs_before_every_route_at_any_depth() {
        let mut base = BaseController::new("/things", Arc::new(DenyAll)).unwrap();
        base.get("", vec![], |_ctx: RequestContext| async { ok(StatusCode::OK) })
            .get("/:id/parts/:part", vec![], |_ctx: RequestContext| async {
                ok(StatusCode::OK)
            });
        let app = base.group().router().unwrap();

        for uri in ["/things", "/things/abc/parts/1"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }

    #[tokio::test]
    async fn methods_on_the_same_path_share_a_route() {
        let mut base = BaseController::without_auth("/things").unwrap();
        base.get("/:id", vec![], |ctx: RequestContext| async move {
            let id = ctx.param("id").unwrap_or_default().to_string();
            ApiResult::Ok(id.into_response())
        })
        .delete("/:id", vec![], |_ctx: RequestContext| async { ok(StatusCode::NO_CONTENT) });
        let app = base.group().router().unwrap();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/things/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"7");

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/things/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}
