//! Domain records and the pure rules around them.

mod cursor;
mod post;
mod user;
mod vote;

pub use cursor::Cursor;
pub use post::{NewPost, Post, PostView, SNIPPET_LEN, redact};
pub use user::{LoginLookup, NewUser, Registration, User, validate_new_password};
pub use vote::{Vote, VoteOutcome, VotePlan, VoteValue};
