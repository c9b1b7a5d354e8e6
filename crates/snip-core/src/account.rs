use crate::error::StorageError;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, StorageError>;

/// A registered user who may own link mappings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    /// PHC-formatted password hash.
    pub password_hash: String,
    pub created_at: Timestamp,
}

#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Stores a new account. Returns `Err(Conflict)` if the username is taken.
    async fn insert_account(&self, account: Account) -> Result<()>;

    /// Looks up an account by username.
    async fn find_account(&self, username: &str) -> Result<Option<Account>>;
}
