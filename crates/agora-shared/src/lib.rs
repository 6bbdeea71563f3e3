//! # Agora Shared
//!
//! Plain HTTP wire types used outside the GraphQL schema: the health check
//! and problem-details error bodies.

pub mod dto;
pub mod response;

pub use dto::HealthResponse;
pub use response::{ErrorResponse, InvalidField};
