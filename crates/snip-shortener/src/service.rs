use async_trait::async_trait;
use snip_core::{LinkMapping, Repository, ShortCode, Shortener, ShortenerError, StorageError};
use snip_generator::Generator;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Default bound on code-allocation attempts per `create` call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Tunables for [`ShortenerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many candidate codes `create` tries before giving up.
    /// Values below 1 are treated as 1.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// The service wraps a `Repository` and a `Generator`. Generated codes are
/// only candidates: the repository's atomic insert decides whether a code is
/// free, and a conflict sends the service back to the generator for a fresh
/// one. The service itself holds no locks.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: ShortenerSettings,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            settings: self.settings,
        }
    }
}

impl<R: Repository, G: Generator> ShortenerService<R, G> {
    /// Creates a service with default settings.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ShortenerSettings::default())
    }

    pub fn with_settings(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self::from_shared(Arc::new(repository), Arc::new(generator), settings)
    }

    /// Creates a service over a repository and generator that are shared
    /// with other owners.
    pub fn from_shared(
        repository: Arc<R>,
        generator: Arc<G>,
        settings: ShortenerSettings,
    ) -> Self {
        Self {
            repository,
            generator,
            settings,
        }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn settings(&self) -> ShortenerSettings {
        self.settings
    }

    fn generate_code(&self) -> ShortCode {
        self.generator.generate().into()
    }
}

#[async_trait]
impl<R: Repository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn create(
        &self,
        target_url: String,
        owner: Option<String>,
    ) -> Result<LinkMapping, ShortenerError> {
        if target_url.is_empty() {
            return Err(ShortenerError::MissingTarget);
        }

        let attempts = self.settings.max_attempts.max(1);

        for attempt in 1..=attempts {
            let mapping =
                LinkMapping::new(self.generate_code(), target_url.clone(), owner.clone());

            match self.repository.insert(mapping.clone()).await {
                Ok(()) => {
                    debug!(code = %mapping.code, attempt, "created short link");
                    return Ok(mapping);
                }
                Err(StorageError::Conflict(_)) => {
                    debug!(code = %mapping.code, attempt, "short code collision, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(attempts, "no free short code found");
        Err(ShortenerError::RetriesExhausted { attempts })
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<String>, ShortenerError> {
        Ok(self.lookup(code).await?.map(|mapping| mapping.target_url))
    }

    async fn lookup(&self, code: &ShortCode) -> Result<Option<LinkMapping>, ShortenerError> {
        trace!(code = %code, "resolving short code");

        let found = self.repository.find_by_code(code).await?;
        if found.is_none() {
            trace!(code = %code, "short code not found");
        }
        Ok(found)
    }
}
