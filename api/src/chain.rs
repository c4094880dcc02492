//! Chain-of-responsibility request handling.
//!
//! Every route is an ordered list of [`Step`]s followed by a [`RouteHandler`].
//! A step either lets the request continue, halts with a response of its own,
//! or signals an [`ApiError`] which is translated into a response in one place.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{Extensions, HeaderMap, Method},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::controller::PathPattern;
use crate::error::{ApiError, ApiResult};

/// Per-request state threaded through every step.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub body: Value,
    pub extensions: Extensions,
    body_error: Option<ApiError>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            params: HashMap::new(),
            query: HashMap::new(),
            body: Value::Object(Map::new()),
            extensions: Extensions::new(),
            body_error: None,
        }
    }

    /// Parse a raw request body. An empty body becomes an empty mapping.
    pub fn parse_body(raw: &Bytes) -> ApiResult<Value> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_slice(raw).map_err(|err| {
            ApiError::bad_request("InvalidRequest", format!("Invalid JSON payload: {}", err))
        })
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Attach the raw body. A parse failure is held back and reported once
    /// the group steps have run, so authentication still comes first.
    pub fn with_raw_body(self, raw: &Bytes) -> Self {
        match Self::parse_body(raw) {
            Ok(body) => self.with_body(body),
            Err(err) => Self {
                body_error: Some(err),
                ..self
            },
        }
    }

    pub fn take_body_error(&mut self) -> Option<ApiError> {
        self.body_error.take()
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Outcome of a step that did not signal an error.
#[derive(Debug)]
pub enum Flow {
    Continue,
    /// The step produced the response itself; nothing after it runs.
    Halt(Response),
}

#[async_trait]
pub trait Step: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow>;
}

pub type BoxedStep = Arc<dyn Step>;

/// The business handler at the end of a route's chain.
#[async_trait]
pub trait RouteHandler: Send + Sync {
    async fn call(&self, ctx: RequestContext) -> ApiResult<Response>;
}

#[async_trait]
impl<F, Fut> RouteHandler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<Response>> + Send,
{
    async fn call(&self, ctx: RequestContext) -> ApiResult<Response> {
        (self)(ctx).await
    }
}

pub type BoxedHandler = Arc<dyn RouteHandler>;

/// Steps registered for a path pattern on the whole route group.
#[derive(Clone)]
pub struct GroupStep {
    pub pattern: PathPattern,
    pub step: BoxedStep,
}

/// Everything a single route runs, in order.
#[derive(Clone)]
pub struct Chain {
    group: Arc<Vec<GroupStep>>,
    steps: Vec<BoxedStep>,
    handler: BoxedHandler,
}

impl Chain {
    pub fn new(group: Arc<Vec<GroupStep>>, steps: Vec<BoxedStep>, handler: BoxedHandler) -> Self {
        Self {
            group,
            steps,
            handler,
        }
    }

    pub async fn run(&self, mut ctx: RequestContext) -> Response {
        let path = ctx.path.clone();
        let group_steps = self
            .group
            .iter()
            .filter(move |registered| registered.pattern.matches(&path))
            .map(|registered| &registered.step);

        for step in group_steps {
            match step.handle(&mut ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt(response)) => return response,
                Err(err) => return err.into_response(),
            }
        }

        if let Some(err) = ctx.take_body_error() {
            return err.into_response();
        }

        for step in &self.steps {
            match step.handle(&mut ctx).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt(response)) => return response,
                Err(err) => return err.into_response(),
            }
        }

        match self.handler.call(ctx).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }
}
