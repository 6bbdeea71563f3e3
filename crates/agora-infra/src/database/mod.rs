//! Storage: the Postgres adapters and the in-memory fallback.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
pub mod entity;
#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
mod postgres_repo;
#[cfg(feature = "postgres")]
mod vote_store;

pub use connections::DatabaseConfig;
pub use memory::{InMemoryStore, InMemoryVoteTransaction};

#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use postgres_base::PostgresBaseRepository;
#[cfg(feature = "postgres")]
pub use postgres_repo::{PostgresPostRepository, PostgresUserRepository};
#[cfg(feature = "postgres")]
pub use vote_store::{PostgresVoteStore, PostgresVoteTransaction};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
