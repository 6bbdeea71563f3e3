//! # Agora Core
//!
//! The domain layer of the Agora forum backend.
//! Plain records, voting and pagination rules, and the ports that
//! infrastructure implements. No database or HTTP dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldError, RepoError};
