pub mod auth;
pub mod auth_middleware;
pub mod chain;
pub mod config;
pub mod controller;
pub mod controllers;
pub mod error;
pub mod observability;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use chain::{BoxedStep, Flow, RequestContext, Step};
pub use controller::{BaseController, Controller};
pub use error::{ApiError, ApiResult, ConfigError, ValidationError, ValidationErrorPlace};
