use crate::error::{AppError, ErrorKind};

pub use crux_kv::error::KeyValueError;
pub use crux_kv::KeyValueOperation;

/// Get, set and delete all resolve to the value previously stored under
/// the key, if any.
pub type KvResult = Result<Option<Vec<u8>>, KeyValueError>;

impl From<KeyValueError> for AppError {
    fn from(err: KeyValueError) -> Self {
        AppError::new(ErrorKind::Storage, "Unable to access device storage")
            .with_internal(format!("{err:?}"))
    }
}
