pub mod errors;
pub mod session;

pub use errors::{DomainError, NotificationError, ValidationError};
pub use session::Session;
