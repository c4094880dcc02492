pub mod contacts;
pub mod health;

pub use contacts::{contact_shape, ContactsController};
pub use health::HealthController;
