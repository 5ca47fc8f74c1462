use thiserror::Error;

/// Coarse classification of an [`EmiError`], used by callers that decide
/// how to report a failure without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    StorageFailure,
    Io,
}

#[derive(Error, Debug)]
pub enum EmiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmiError::InvalidInput(_) => ErrorKind::InvalidInput,
            EmiError::NotFound(_) => ErrorKind::NotFound,
            EmiError::Storage(_) => ErrorKind::StorageFailure,
            EmiError::Csv(_) | EmiError::Io(_) => ErrorKind::Io,
        }
    }

    /// Wraps any storage-side failure (constraint violation, codec error, backend error).
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        EmiError::Storage(err.into())
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for EmiError {
    fn from(err: rocksdb::Error) -> Self {
        EmiError::Storage(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, EmiError>;
