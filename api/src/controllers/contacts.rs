//! CRUD endpoints for contacts, each guarded by the shared validation steps.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{ContactPatch, NewContact, ObjectId};

use crate::chain::RequestContext;
use crate::controller::{BaseController, Controller};
use crate::error::{ApiError, ApiResult, ConfigError, ValidationError, ValidationErrorPlace};
use crate::state::AppState;
use crate::store::ContactStore;
use crate::validation::{Field, FieldKind, Rule, Shape, INVALID_ID_MESSAGE};

const MAX_TAGS: usize = 10;

/// Declared shape of a contact payload, shared by create, replace and patch.
pub fn contact_shape() -> Result<Shape, ConfigError> {
    let address = Shape::builder()
        .field(Field::string("street").optional().rule(Rule::MaxLength(200)))
        .field(
            Field::string("city")
                .rule(Rule::NotEmpty)
                .rule(Rule::MaxLength(100)),
        )
        .field(
            Field::string("zip")
                .optional()
                .rule(Rule::matches(r"^[A-Za-z0-9 -]{3,10}$")?),
        )
        .build()?;

    Shape::builder()
        .field(
            Field::string("name")
                .rule(Rule::NotEmpty)
                .rule(Rule::MaxLength(100)),
        )
        .field(Field::string("email").rule(Rule::Email))
        .field(
            Field::string("phone")
                .optional()
                .rule(Rule::matches(r"^\+?[0-9 ()-]{3,20}$")?),
        )
        .field(Field::object("address", address))
        .field(
            Field::list("tags", FieldKind::String)
                .optional()
                .rule(Rule::MaxItems(MAX_TAGS)),
        )
        .field(Field::boolean("active").optional())
        .build()
}

pub struct ContactsController {
    base: BaseController,
    store: Arc<ContactStore>,
    shape: Arc<Shape>,
}

impl ContactsController {
    pub const PATH: &'static str = "/api/contacts";

    pub fn new(state: &AppState) -> Result<Self, ConfigError> {
        Ok(Self {
            base: BaseController::new(Self::PATH, Arc::clone(&state.authenticator))?,
            store: Arc::clone(&state.contacts),
            shape: Arc::new(contact_shape()?),
        })
    }
}

impl Controller for ContactsController {
    fn base(&self) -> &BaseController {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BaseController {
        &mut self.base
    }

    fn initialize_routes(&mut self) {
        let validator = self.base.validator().clone();
        let shape = &self.shape;

        let store = Arc::clone(&self.store);
        self.base.get("", vec![], move |ctx: RequestContext| {
            list_contacts(Arc::clone(&store), ctx)
        });

        let store = Arc::clone(&self.store);
        self.base.post(
            "",
            vec![validator.check_body(Arc::clone(shape), false)],
            move |ctx: RequestContext| create_contact(Arc::clone(&store), ctx),
        );

        let store = Arc::clone(&self.store);
        self.base.get("/:id", validator.check_id(), move |ctx: RequestContext| {
            get_contact(Arc::clone(&store), ctx)
        });

        let store = Arc::clone(&self.store);
        self.base.put(
            "/:id",
            validator.check_id_and_body(Arc::clone(shape), false),
            move |ctx: RequestContext| replace_contact(Arc::clone(&store), ctx),
        );

        let store = Arc::clone(&self.store);
        self.base.patch(
            "/:id",
            validator.check_id_and_body(Arc::clone(shape), true),
            move |ctx: RequestContext| patch_contact(Arc::clone(&store), ctx),
        );

        let store = Arc::clone(&self.store);
        self.base.delete("/:id", validator.check_id(), move |ctx: RequestContext| {
            delete_contact(Arc::clone(&store), ctx)
        });
    }
}

fn contact_id(ctx: &RequestContext) -> ApiResult<ObjectId> {
    ctx.param("id")
        .unwrap_or_default()
        .parse()
        .map_err(|_| {
            ApiError::from(ValidationError::single(
                ValidationErrorPlace::Url,
                INVALID_ID_MESSAGE,
            ))
        })
}

fn typed_body<T: DeserializeOwned>(body: Value) -> ApiResult<T> {
    serde_json::from_value(body).map_err(|err| {
        tracing::error!(error = %err, "validated body did not match its payload type");
        ApiError::internal("Failed to read request body")
    })
}

fn contact_not_found(id: &ObjectId) -> ApiError {
    ApiError::not_found("ContactNotFound", format!("No contact found with ID: {}", id))
}

async fn list_contacts(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let active_only = BaseController::get_bool_from_query(&ctx, "active");
    let contacts = store.list(active_only).await;
    Ok(Json(contacts).into_response())
}

async fn create_contact(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let new: NewContact = typed_body(ctx.body)?;
    let contact = store.create(new).await;
    tracing::info!(id = %contact.id, "contact created");
    Ok((StatusCode::CREATED, Json(contact)).into_response())
}

async fn get_contact(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let id = contact_id(&ctx)?;
    let contact = store.get(&id).await.ok_or_else(|| contact_not_found(&id))?;
    Ok(Json(contact).into_response())
}

async fn replace_contact(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let id = contact_id(&ctx)?;
    let new: NewContact = typed_body(ctx.body)?;
    let contact = store
        .replace(&id, new)
        .await
        .ok_or_else(|| contact_not_found(&id))?;
    Ok(Json(contact).into_response())
}

async fn patch_contact(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let id = contact_id(&ctx)?;
    let patch: ContactPatch = typed_body(ctx.body)?;
    let contact = store
        .patch(&id, patch)
        .await
        .ok_or_else(|| contact_not_found(&id))?;
    Ok(Json(contact).into_response())
}

async fn delete_contact(store: Arc<ContactStore>, ctx: RequestContext) -> ApiResult<Response> {
    let id = contact_id(&ctx)?;
    if !store.delete(&id).await {
        return Err(contact_not_found(&id));
    }
    tracing::info!(%id, "contact deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}
