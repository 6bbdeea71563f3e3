//! Application services built on the ports.

mod accounts;
mod feed;
mod posts;
mod vote_ledger;

pub use accounts::AccountService;
pub use feed::{FeedPaginator, MAX_FEED_LIMIT, PaginatedPosts};
pub use posts::PostService;
pub use vote_ledger::{MAX_VOTE_ATTEMPTS, VoteLedger};
