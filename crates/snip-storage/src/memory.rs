use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use snip_core::repository::Result;
use snip_core::{
    Account, AccountRepository, LinkMapping, ReadRepository, Repository, ShortCode, StorageError,
};
use tracing::trace;

/// In-memory implementation of the mapping store using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Inserts go through the entry API, which holds
/// the shard lock across the vacancy check and the write.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: DashMap<ShortCode, LinkMapping>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Returns a snapshot of every stored mapping.
    pub fn mappings(&self) -> Vec<LinkMapping> {
        self.storage
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<LinkMapping>> {
        Ok(self.storage.get(code).map(|entry| entry.value().clone()))
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        Ok(self.storage.contains_key(code))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, mapping: LinkMapping) -> Result<()> {
        match self.storage.entry(mapping.code.clone()) {
            Entry::Occupied(_) => {
                trace!(code = %mapping.code, "code already taken");
                Err(StorageError::Conflict(mapping.code.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(mapping);
                Ok(())
            }
        }
    }
}

/// In-memory account store keyed by username.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<String, Account>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert_account(&self, account: Account) -> Result<()> {
        match self.accounts.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(account.username)),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(())
            }
        }
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .get(username)
            .map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use std::sync::Arc;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn mapping(c: &str, url: &str, owner: Option<&str>) -> LinkMapping {
        LinkMapping {
            code: code(c),
            target_url: url.to_string(),
            owner: owner.map(str::to_string),
            created_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_find() {
        let repo = InMemoryRepository::new();
        let stored = mapping("abc12", "https://example.com", Some("alice"));

        repo.insert(stored.clone()).await.unwrap();

        let result = repo.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(result, stored);
    }

    #[tokio::test]
    async fn find_nonexistent() {
        let repo = InMemoryRepository::new();

        let result = repo.find_by_code(&code("nope")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_conflict_keeps_first_mapping() {
        let repo = InMemoryRepository::new();

        repo.insert(mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        let err = repo
            .insert(mapping("abc12", "https://other.com", None))
            .await
            .unwrap_err();

        assert_eq!(err, StorageError::Conflict("abc12".to_string()));
        let kept = repo.find_by_code(&code("abc12")).await.unwrap().unwrap();
        assert_eq!(kept.target_url, "https://example.com");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn exists_checks() {
        let repo = InMemoryRepository::new();

        assert!(!repo.exists(&code("abc12")).await.unwrap());

        repo.insert(mapping("abc12", "https://example.com", None))
            .await
            .unwrap();

        assert!(repo.exists(&code("abc12")).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_code_admit_one_winner() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..32u32 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.insert(mapping("AAAAA", &format!("https://example{i}.com"), None))
                    .await
            }));
        }

        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => wins += 1,
                Err(err) => assert!(matches!(err, StorageError::Conflict(_))),
            }
        }

        assert_eq!(wins, 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_access() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let m = mapping(&format!("code{i:03}"), &format!("https://example{i}.com"), None);
                repo.insert(m).await.unwrap();
            }));
        }

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                let _ = repo.find_by_code(&code(&format!("code{i:03}"))).await;
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10u64 {
            let result = repo
                .find_by_code(&code(&format!("code{i:03}")))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(result.target_url, format!("https://example{i}.com"));
        }
    }

    #[tokio::test]
    async fn accounts_are_unique_by_username() {
        let repo = InMemoryAccountRepository::new();
        let account = Account {
            username: "alice".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: Timestamp::now(),
        };

        repo.insert_account(account.clone()).await.unwrap();
        let err = repo.insert_account(account.clone()).await.unwrap_err();

        assert!(matches!(err, StorageError::Conflict(name) if name == "alice"));
        assert_eq!(repo.find_account("alice").await.unwrap(), Some(account));
        assert!(repo.find_account("bob").await.unwrap().is_none());
    }
}
