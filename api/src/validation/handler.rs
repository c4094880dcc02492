//! Request validation steps: identifier check and body-shape check.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinError;

use super::shape::Shape;
use super::validators::is_object_id;
use super::violation::flatten_all;
use crate::chain::{BoxedStep, Flow, RequestContext, Step};
use crate::error::{ApiError, ApiResult, ValidationError, ValidationErrorPlace};

pub const BODY_REQUIRED_MESSAGE: &str = "Body of the request is required";
pub const INVALID_ID_MESSAGE: &str = "id URL param has invalid value";

const ID_PARAM: &str = "id";

/// Result of checking a request body against a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// The coerced body, holding only declared fields.
    Valid(Value),
    Invalid(ValidationError),
}

/// `null`, `{}`, `[]`, `""` and bare numbers or booleans carry no fields at all.
pub fn is_structurally_empty(body: &Value) -> bool {
    match body {
        Value::Null | Value::Bool(_) | Value::Number(_) => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
    }
}

fn validation_aborted(err: JoinError, path: &str) -> ApiError {
    tracing::error!(error = %err, path = %path, "body validation did not complete");
    ApiError::internal("Request validation failed unexpectedly")
}

fn validate_body(shape: &Shape, raw: &Value, skip_missing: bool) -> ValidationOutcome {
    let coerced = shape.coerce(raw);
    let violations = shape.validate(&coerced, skip_missing);
    if violations.is_empty() {
        ValidationOutcome::Valid(coerced)
    } else {
        ValidationOutcome::Invalid(ValidationError::new(
            ValidationErrorPlace::Body,
            flatten_all(&violations),
        ))
    }
}

/// Builds validation steps for controllers.
#[derive(Debug, Clone, Default)]
pub struct ValidationHandler;

impl ValidationHandler {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous body check, as run by the step returned from
    /// [`ValidationHandler::check_body`].
    pub fn check(shape: &Shape, raw: &Value, skip_missing: bool) -> ValidationOutcome {
        if is_structurally_empty(raw) {
            return ValidationOutcome::Invalid(ValidationError::single(
                ValidationErrorPlace::Body,
                BODY_REQUIRED_MESSAGE,
            ));
        }
        validate_body(shape, raw, skip_missing)
    }

    pub fn check_body(&self, shape: Arc<Shape>, skip_missing: bool) -> BoxedStep {
        Arc::new(BodyCheck {
            shape,
            skip_missing,
        })
    }

    pub fn check_id(&self) -> Vec<BoxedStep> {
        vec![Arc::new(IdCheck)]
    }

    /// Identifier check first, so a bad id is reported before the body is looked at.
    pub fn check_id_and_body(&self, shape: Arc<Shape>, skip_missing: bool) -> Vec<BoxedStep> {
        let mut steps = self.check_id();
        steps.push(self.check_body(shape, skip_missing));
        steps
    }
}

struct IdCheck;

#[async_trait]
impl Step for IdCheck {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow> {
        match ctx.param(ID_PARAM) {
            Some(id) if is_object_id(id) => Ok(Flow::Continue),
            _ => Err(ValidationError::single(ValidationErrorPlace::Url, INVALID_ID_MESSAGE).into()),
        }
    }
}

struct BodyCheck {
    shape: Arc<Shape>,
    skip_missing: bool,
}

#[async_trait]
impl Step for BodyCheck {
    async fn handle(&self, ctx: &mut RequestContext) -> ApiResult<Flow> {
        if is_structurally_empty(&ctx.body) {
            return Err(
                ValidationError::single(ValidationErrorPlace::Body, BODY_REQUIRED_MESSAGE).into(),
            );
        }

        let shape = Arc::clone(&self.shape);
        let raw = std::mem::take(&mut ctx.body);
        let skip_missing = self.skip_missing;

        let outcome = tokio::task::spawn_blocking(move || validate_body(&shape, &raw, skip_missing))
            .await
            .map_err(|err| validation_aborted(err, &ctx.path))?;

        match outcome {
            ValidationOutcome::Valid(body) => {
                ctx.body = body;
                Ok(Flow::Continue)
            }
            ValidationOutcome::Invalid(err) => {
                tracing::debug!(path = %ctx.path, errors = err.errors.len(), "request body rejected");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::shape::{Field, Rule};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn contact_shape() -> Arc<Shape> {
        let address = Shape::builder()
            .field(Field::string("city").rule(Rule::NotEmpty))
            .build()
            .unwrap();
        Arc::new(
            Shape::builder()
                .field(Field::string("name").rule(Rule::NotEmpty))
                .field(Field::object("address", address))
                .build()
                .unwrap(),
        )
    }

    fn ctx_with(id: Option<&str>, body: Value) -> RequestContext {
        let mut ctx = RequestContext::new(Method::PUT, "/things/x").with_body(body);
        if let Some(id) = id {
            ctx.params.insert("id".to_string(), id.to_string());
        }
        ctx
    }

    async fn run(steps: &[BoxedStep], ctx: &mut RequestContext) -> ApiResult<()> {
        for step in steps {
            match step.handle(ctx).await? {
                Flow::Continue => {}
                Flow::Halt(_) => return Ok(()),
            }
        }
        Ok(())
    }

    #[test]
    fn structurally_empty_bodies() {
        assert!(is_structurally_empty(&json!(null)));
        assert!(is_structurally_empty(&json!({})));
        assert!(is_structurally_empty(&json!([])));
        assert!(is_structurally_empty(&json!("")));
        assert!(!is_structurally_empty(&json!({ "a": 1 })));
        assert!(is_structurally_empty(&json!(0)));
        assert!(is_structurally_empty(&json!(true)));
        assert!(!is_structurally_empty(&json!("x")));
        assert!(!is_structurally_empty(&json!([1])));
    }

    #[tokio::test]
    async fn panicking_validation_becomes_internal_error() {
        let join = tokio::task::spawn_blocking(|| -> ValidationOutcome {
            panic!("validator blew up");
        })
        .await;
        let err = validation_aborted(join.unwrap_err(), "/things");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_validation());

        let response = axum::response::IntoResponse::into_response(err);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], "Request validation failed unexpectedly");
    }

    #[test]
    fn check_reports_empty_body() {
        let outcome = ValidationHandler::check(&contact_shape(), &json!({}), false);
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(ValidationError::single(
                ValidationErrorPlace::Body,
                BODY_REQUIRED_MESSAGE
            ))
        );
    }

    #[test]
    fn check_flattens_violations() {
        let outcome = ValidationHandler::check(&contact_shape(), &json!({ "name": "" }), false);
        let ValidationOutcome::Invalid(err) = outcome else {
            panic!("expected invalid outcome");
        };
        assert_eq!(err.place, ValidationErrorPlace::Body);
        assert_eq!(
            err.errors,
            vec!["name should not be empty", "address: address is required; city is required"]
        );

        let outcome = ValidationHandler::check(
            &contact_shape(),
            &json!({ "name": "", "address": {} }),
            false,
        );
        let ValidationOutcome::Invalid(err) = outcome else {
            panic!("expected invalid outcome");
        };
        assert_eq!(err.errors, vec!["name should not be empty", "address: city is required"]);
    }

    #[test]
    fn check_returns_coerced_body() {
        let outcome = ValidationHandler::check(
            &contact_shape(),
            &json!({ "name": "Ada", "address": { "city": "London" }, "role": "admin" }),
            false,
        );
        assert_eq!(
            outcome,
            ValidationOutcome::Valid(json!({ "name": "Ada", "address": { "city": "London" } }))
        );
    }

    #[tokio::test]
    async fn id_check_rejects_bad_identifiers() {
        let handler = ValidationHandler::new();
        for id in [Some("not-a-valid-id"), Some(""), None] {
            let mut ctx = ctx_with(id, json!({}));
            let err = run(&handler.check_id(), &mut ctx).await.unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.place(), Some(ValidationErrorPlace::Url));
            assert_eq!(err.errors(), [INVALID_ID_MESSAGE.to_string()]);
        }

        let mut ctx = ctx_with(Some("507f1f77bcf86cd799439011"), json!({}));
        assert!(run(&handler.check_id(), &mut ctx).await.is_ok());
    }

    #[tokio::test]
    async fn body_step_replaces_body_on_success() {
        let handler = ValidationHandler::new();
        let mut ctx = ctx_with(None, json!({ "name": "Ada", "address": { "city": "X" }, "x": 1 }));
        run(&[handler.check_body(contact_shape(), false)], &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.body, json!({ "name": "Ada", "address": { "city": "X" } }));
    }

    #[tokio::test]
    async fn body_step_requires_a_body() {
        let handler = ValidationHandler::new();
        let mut ctx = ctx_with(None, json!({}));
        let err = run(&[handler.check_body(contact_shape(), true)], &mut ctx)
            .await
            .unwrap_err();
        assert_eq!(err.place(), Some(ValidationErrorPlace::Body));
        assert_eq!(err.errors(), [BODY_REQUIRED_MESSAGE.to_string()]);
    }

    #[tokio::test]
    async fn body_step_honours_skip_missing() {
        let handler = ValidationHandler::new();
        let mut ctx = ctx_with(None, json!({ "name": "Grace" }));
        run(&[handler.check_body(contact_shape(), true)], &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.body, json!({ "name": "Grace" }));
    }

    #[tokio::test]
    async fn id_failure_is_reported_before_body() {
        let handler = ValidationHandler::new();
        let steps = handler.check_id_and_body(contact_shape(), false);
        assert_eq!(steps.len(), 2);

        let mut ctx = ctx_with(Some("not-a-valid-id"), json!({ "name": "" }));
        let err = run(&steps, &mut ctx).await.unwrap_err();
        assert_eq!(err.place(), Some(ValidationErrorPlace::Url));

        let mut ctx = ctx_with(Some("507f1f77bcf86cd799439011"), json!({ "name": "" }));
        let err = run(&steps, &mut ctx).await.unwrap_err();
        assert_eq!(err.place(), Some(ValidationErrorPlace::Body));
    }
}
