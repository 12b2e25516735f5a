use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Message { message: String },

    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("{0} capability not wired")]
    Unavailable(&'static str),
}

impl ServiceError {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type ServiceResult<T = serde_json::Value> = Result<T, ServiceError>;
