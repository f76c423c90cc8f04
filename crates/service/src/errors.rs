use thiserror::Error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid owner: {0}")]
    InvalidOwner(String),
    #[error("invalid item: {0}")]
    InvalidItem(String),
    #[error("corrupt cart record: {0}")]
    RecordDecode(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("cart {owner} kept changing underneath {attempts} write attempts")]
    WriteConflict { owner: String, attempts: u32 },
}

impl ServiceError {
    /// Stable kind string for response bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidOwner(_) => "invalid_owner",
            ServiceError::InvalidItem(_) => "request_decode",
            ServiceError::RecordDecode(_) => "record_decode",
            ServiceError::StoreUnavailable(_) => "store_unavailable",
            ServiceError::WriteConflict { .. } => "write_conflict",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        ServiceError::StoreUnavailable(e.to_string())
    }
}
