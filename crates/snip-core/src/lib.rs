//! Core types and traits for the snip URL shortener.
//!
//! This crate provides the shared vocabulary used by the generator, the
//! storage backends, the shortener service and the access gate.

pub mod account;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use account::{Account, AccountRepository};
pub use error::{CoreError, ShortenerError, StorageError};
pub use repository::{LinkMapping, ReadRepository, Repository};
pub use shortcode::ShortCode;
pub use shortener::Shortener;
