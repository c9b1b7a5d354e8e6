use crate::error::{AccessError, Result};
use crate::password::{dummy_hash, hash_password, verify_absent, verify_password};
use jiff::Timestamp;
use snip_core::{Account, AccountRepository, StorageError};
use std::sync::Arc;
use tracing::{debug, info};

/// Whether link creation needs a logged-in owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatePolicy {
    /// Anyone may create links; an identified user is recorded as owner.
    #[default]
    Open,
    /// Only existing accounts may create links.
    LoginRequired,
}

/// Credential checks in front of the shortener.
#[derive(Debug)]
pub struct AccessGate<A> {
    accounts: Arc<A>,
    policy: GatePolicy,
}

impl<A> Clone for AccessGate<A> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            policy: self.policy,
        }
    }
}

impl<A: AccountRepository> AccessGate<A> {
    pub fn new(accounts: A, policy: GatePolicy) -> Self {
        Self::from_shared(Arc::new(accounts), policy)
    }

    pub fn from_shared(accounts: Arc<A>, policy: GatePolicy) -> Self {
        // Hash the absent-account password before the first login.
        let _ = dummy_hash();
        Self { accounts, policy }
    }

    pub fn policy(&self) -> GatePolicy {
        self.policy
    }

    /// Creates an account and returns its username.
    pub async fn register(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(AccessError::MissingCredentials);
        }

        let account = Account {
            username: username.to_string(),
            password_hash: hash_password(password)?,
            created_at: Timestamp::now(),
        };

        match self.accounts.insert_account(account).await {
            Ok(()) => {
                info!(username, "registered account");
                Ok(username.to_string())
            }
            Err(StorageError::Conflict(_)) => Err(AccessError::UsernameTaken(username.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    /// Verifies a username/password pair and returns the owner identity.
    ///
    /// Unknown users and wrong passwords both yield `InvalidCredentials`,
    /// and both run one Argon2 verification.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String> {
        if username.is_empty() || password.is_empty() {
            return Err(AccessError::MissingCredentials);
        }

        let Some(account) = self.accounts.find_account(username).await? else {
            verify_absent(password);
            debug!(username, "login for unknown account");
            return Err(AccessError::InvalidCredentials);
        };

        if !verify_password(password, &account.password_hash)? {
            debug!(username, "login with wrong password");
            return Err(AccessError::InvalidCredentials);
        }

        Ok(account.username)
    }

    /// Confirms that a session identity still names an existing account.
    pub async fn identify(&self, session_user: Option<&str>) -> Result<Option<String>> {
        let Some(username) = session_user.filter(|name| !name.is_empty()) else {
            return Ok(None);
        };

        Ok(self
            .accounts
            .find_account(username)
            .await?
            .map(|account| account.username))
    }

    /// Resolves the owner to record for a new link under the gate policy.
    pub async fn owner_for_create(&self, session_user: Option<&str>) -> Result<Option<String>> {
        let owner = self.identify(session_user).await?;

        match (self.policy, owner) {
            (GatePolicy::LoginRequired, None) => Err(AccessError::NotAuthenticated),
            (_, owner) => Ok(owner),
        }
    }
}
