//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which allocates short codes with
//! a [`Generator`](snip_generator::Generator) and stores mappings in a
//! [`Repository`](snip_core::Repository). Core types are re-exported from
//! `snip_core`.

pub mod service;

pub use service::{ShortenerService, ShortenerSettings, DEFAULT_MAX_ATTEMPTS};
pub use snip_core::{LinkMapping, ShortCode, Shortener, ShortenerError};
