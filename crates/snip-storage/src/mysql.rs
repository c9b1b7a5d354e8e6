use async_trait::async_trait;
use jiff::Timestamp;
use snip_core::repository::Result;
use snip_core::{
    Account, AccountRepository, LinkMapping, ReadRepository, Repository, ShortCode, StorageError,
};
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySqlPool, Row};
use std::time::Duration;
use tracing::{debug, info};

const LINK_MAPPINGS_DDL: &str = include_str!("../ddl/mysql/link_mappings.sql");
const ACCOUNTS_DDL: &str = include_str!("../ddl/mysql/accounts.sql");

/// How long a query waits for a pooled connection before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// MySQL implementation of the mapping and account stores.
///
/// Uniqueness is enforced by primary keys on `link_mappings.code` and
/// `accounts.username`; a duplicate-key error from the database is reported
/// as [`StorageError::Conflict`]. There is no read-before-write on insert.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        Self::connect_with_timeout(database_url, DEFAULT_ACQUIRE_TIMEOUT).await
    }

    /// Like [`MySqlRepository::connect`] with an explicit acquire timeout.
    pub async fn connect_with_timeout(
        database_url: &str,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        info!("connected to mysql");
        Ok(Self::new(pool))
    }

    /// Creates the `link_mappings` and `accounts` tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        for ddl in [LINK_MAPPINGS_DDL, ACCOUNTS_DDL] {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        }
        debug!("mysql schema ready");
        Ok(())
    }

    /// Closes every pooled connection. Later calls fail with `Unavailable`.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("mysql pool closed");
    }
}

fn parse_created_at(millis: i64) -> Result<Timestamp> {
    Timestamp::from_millisecond(millis).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", millis))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn mapping_from_row(row: &MySqlRow) -> Result<LinkMapping> {
    let code: String = row.try_get("code").map_err(map_sqlx_error)?;
    let code = ShortCode::new(&code).map_err(|e| StorageError::InvalidData(e.to_string()))?;
    let target_url: String = row.try_get("target_url").map_err(map_sqlx_error)?;
    let owner: Option<String> = row.try_get("owner").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    Ok(LinkMapping {
        code,
        target_url,
        owner,
        created_at: parse_created_at(created_at)?,
    })
}

#[async_trait]
impl ReadRepository for MySqlRepository {
    async fn find_by_code(&self, code: &ShortCode) -> Result<Option<LinkMapping>> {
        let row = sqlx::query(
            r#"
            SELECT code, target_url, owner, created_at
            FROM link_mappings
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(mapping_from_row).transpose()
    }

    async fn exists(&self, code: &ShortCode) -> Result<bool> {
        let exists = sqlx::query(
            r#"
            SELECT 1
            FROM link_mappings
            WHERE code = ?
            LIMIT 1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?
        .is_some();

        Ok(exists)
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn insert(&self, mapping: LinkMapping) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO link_mappings (code, target_url, owner, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(mapping.code.as_str())
        .bind(&mapping.target_url)
        .bind(mapping.owner.as_deref())
        .bind(mapping.created_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(StorageError::Conflict(mapping.code.to_string()))
            }
            Err(err) => Err(map_sqlx_error(err)),
        }
    }
}

#[async_trait]
impl AccountRepository for MySqlRepository {
    async fn insert_account(&self, account: Account) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (username, password_hash, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&account.username)
        .bind(&account.password_hash)
        .bind(account.created_at.as_millisecond())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(account.username)),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn find_account(&self, username: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT username, password_hash, created_at
            FROM accounts
            WHERE username = ?
            LIMIT 1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
        Ok(Some(Account {
            username: row.try_get("username").map_err(map_sqlx_error)?,
            password_hash: row.try_get("password_hash").map_err(map_sqlx_error)?,
            created_at: parse_created_at(created_at)?,
        }))
    }
}
