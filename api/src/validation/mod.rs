//! Request Validation Module
//!
//! Checks incoming request bodies and URL identifiers before a route's
//! business handler runs.
//!
//! # Overview
//!
//! The validation system consists of four components:
//!
//! 1. **Shapes** - data-described field declarations (`Shape`, `Field`, `Rule`)
//! 2. **Violations** - the per-field failure tree and its flattening
//! 3. **Handler** - chain steps (`check_id`, `check_body`, `check_id_and_body`)
//! 4. **Validators** - format checks shared by rules and steps
//!
//! # Usage
//!
//! ```ignore
//! let shape = Arc::new(
//!     Shape::builder()
//!         .field(Field::string("name").rule(Rule::NotEmpty))
//!         .build()?,
//! );
//!
//! let steps = base.validator().check_id_and_body(shape, true);
//! base.patch("/:id", steps, update_item);
//! ```
//!
//! # Validation Error Response
//!
//! When validation fails, a 400 Bad Request is returned:
//!
//! ```json
//! {
//!   "error": "ValidationError",
//!   "message": "Validation failed with 2 errors",
//!   "place": "Body",
//!   "errors": [
//!     "name should not be empty",
//!     "address: city is required"
//!   ],
//!   "code": 400,
//!   "timestamp": "2026-02-20T10:30:00Z",
//!   "correlation_id": "uuid-here"
//! }
//! ```

pub mod handler;
pub mod shape;
pub mod validators;
pub mod violation;

// Re-export commonly used items
pub use handler::{
    is_structurally_empty, ValidationHandler, ValidationOutcome, BODY_REQUIRED_MESSAGE,
    INVALID_ID_MESSAGE,
};
pub use shape::{Field, FieldKind, Rule, Shape, ShapeBuilder};
pub use validators::{is_boolean_string, is_email, is_object_id, is_url};
pub use violation::{flatten_all, Violation};
