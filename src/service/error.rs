use crate::storage::StorageError;

use super::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Missing translation {locale}.{key}")]
    MissingTranslation { locale: &'static str, key: &'static str },
    #[error("Missing documentation {path}: {source}")]
    MissingDoc {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
