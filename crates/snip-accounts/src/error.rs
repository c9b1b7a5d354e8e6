use snip_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccessError>;

/// Failures of the access gate.
///
/// Storage failures are kept apart from credential failures: a store that
/// cannot be reached never looks like a user who is not logged in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("username already taken: {0}")]
    UsernameTaken(String),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("login required")]
    NotAuthenticated,
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("account storage error: {0}")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for AccessError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}
