pub mod dialogue;
pub mod doc;
mod error;
pub mod language;
pub mod session;

pub use error::ServiceError;
