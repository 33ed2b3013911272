use shuttle_runtime::Error as ShuttleError;

use crate::{
    config::ConfigError,
    service::{session::SessionError, ServiceError},
    storage::StorageError,
    transport::DeliveryError,
};

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Malformed update: {0}")]
    MalformedUpdate(String),

    #[error(transparent)]
    Other(anyhow::Error),
}

impl From<BotError> for ShuttleError {
    fn from(error: BotError) -> Self {
        ShuttleError::Custom(anyhow::anyhow!(error))
    }
}

impl From<SessionError> for BotError {
    fn from(error: SessionError) -> Self {
        BotError::ServiceError(ServiceError::Session(error))
    }
}

impl From<anyhow::Error> for BotError {
    fn from(error: anyhow::Error) -> Self {
        BotError::Other(error)
    }
}

pub type HandlerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub type BotResult<T> = Result<T, BotError>;
