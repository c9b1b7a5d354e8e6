use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A stored association between a short code and its target URL.
///
/// Mappings are created once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMapping {
    /// The unique short code.
    pub code: ShortCode,
    /// The destination the short code redirects to.
    pub target_url: String,
    /// Identity of the account that created the mapping, if any.
    pub owner: Option<String>,
    /// When the mapping was stored.
    pub created_at: Timestamp,
}

impl LinkMapping {
    /// Builds a mapping stamped with the current time.
    pub fn new(code: ShortCode, target_url: impl Into<String>, owner: Option<String>) -> Self {
        Self {
            code,
            target_url: target_url.into(),
            owner,
            created_at: Timestamp::now(),
        }
    }
}

/// A read-only view of a mapping store.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the mapping for a given short code.
    /// Returns `None` if the code does not exist.
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<LinkMapping>>;

    /// Checks whether a short code is currently stored.
    async fn exists(&self, code: &ShortCode) -> Result<bool>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new mapping. Returns `Err(Conflict)` if the code already exists.
    ///
    /// The existence check and the write must be a single atomic step per
    /// code: two concurrent inserts of the same code never both succeed.
    async fn insert(&self, mapping: LinkMapping) -> Result<()>;
}
