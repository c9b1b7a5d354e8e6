//! Storage backends for link mappings and accounts.

pub mod memory;
pub mod mysql;

pub use memory::{InMemoryAccountRepository, InMemoryRepository};
pub use mysql::MySqlRepository;
pub use snip_core::{
    Account, AccountRepository, LinkMapping, ReadRepository, Repository, StorageError,
};
