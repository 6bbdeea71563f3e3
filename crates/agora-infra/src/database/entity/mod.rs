//! SeaORM entities. Converted to and from `agora_core::domain` records at the
//! repository boundary.

pub mod post;
pub mod user;
pub mod vote;
