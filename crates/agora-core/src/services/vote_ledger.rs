use std::sync::Arc;

use crate::domain::{Vote, VoteOutcome, VotePlan, VoteValue};
use crate::error::{DomainError, RepoError};
use crate::ports::VoteStore;

/// Total tries for one vote when the store reports a retryable conflict.
pub const MAX_VOTE_ATTEMPTS: u32 = 3;

/// Records one vote per (user, post) and keeps `post.points` in step with it.
pub struct VoteLedger {
    store: Arc<dyn VoteStore>,
}

impl VoteLedger {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    pub async fn cast_vote(
        &self,
        viewer: Option<i32>,
        post_id: i32,
        value: i32,
    ) -> Result<VoteOutcome, DomainError> {
        let user_id = viewer.ok_or(DomainError::Unauthenticated)?;
        let vote = Vote {
            user_id,
            post_id,
            value: VoteValue::try_from(value)?,
        };

        let mut attempt = 1;
        loop {
            match self.apply(vote).await {
                Ok(outcome) => {
                    tracing::debug!(user_id, post_id, ?outcome, attempt, "Vote applied");
                    return Ok(outcome);
                }
                Err(err) if err.is_retryable() && attempt < MAX_VOTE_ATTEMPTS => {
                    tracing::warn!(user_id, post_id, attempt, error = %err, "Retrying vote");
                    attempt += 1;
                }
                Err(RepoError::NotFound) => {
                    return Err(DomainError::NotFound {
                        entity_type: "post",
                        id: post_id,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One attempt. The stored vote is re-read inside the transaction so the
    /// decision never rests on a stale read.
    async fn apply(&self, vote: Vote) -> Result<VoteOutcome, RepoError> {
        let mut tx = self.store.begin().await?;

        let existing = tx.current_vote(vote.user_id, vote.post_id).await?;
        let plan = VotePlan::decide(existing, vote.value);

        match plan {
            VotePlan::Insert { delta } => {
                tx.insert_vote(vote).await?;
                tx.adjust_points(vote.post_id, delta).await?;
            }
            VotePlan::Flip { delta } => {
                tx.update_vote(vote).await?;
                tx.adjust_points(vote.post_id, delta).await?;
            }
            VotePlan::Keep => {}
        }

        tx.commit().await?;
        Ok(plan.outcome())
    }
}
