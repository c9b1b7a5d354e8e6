use crate::repository::LinkMapping;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Allocates a fresh short code for `target_url` and stores the mapping.
    async fn create(&self, target_url: String, owner: Option<String>) -> Result<LinkMapping>;

    /// Resolves a short code to its target URL.
    /// Returns `None` if the code does not exist.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Returns the full stored mapping for a short code.
    async fn lookup(&self, code: &ShortCode) -> Result<Option<LinkMapping>>;
}
