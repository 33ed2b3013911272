use crate::storage::StorageError;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Role not found: {0}")]
    RoleNotFound(String),
    #[error("Failed to encode session context: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
