//! Account registration and the access gate in front of link creation.
//!
//! The gate turns a session identity into the opaque owner string the
//! shortener records, and decides whether anonymous creation is allowed.

pub mod error;
pub mod gate;
pub mod password;

pub use error::AccessError;
pub use gate::{AccessGate, GatePolicy};
