//! PostgreSQL vote store.
//!
//! Each vote runs in a `READ COMMITTED` transaction. The existing vote row is
//! read with `SELECT ... FOR UPDATE`, so concurrent changes to the same
//! (user, post) queue behind each other. Two concurrent *first* votes cannot
//! lock a row that does not exist yet; the loser hits the primary key and
//! gets `RepoError::Conflict`, and the ledger retries.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseTransaction, DbConn, EntityTrait, IsolationLevel, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};

use agora_core::domain::{Vote, VoteValue};
use agora_core::error::RepoError;
use agora_core::ports::{VoteStore, VoteTransaction};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::vote::{self, Entity as VoteEntity};
use super::postgres_base::map_db_err;

pub struct PostgresVoteStore {
    pub(crate) db: DbConn,
}

impl PostgresVoteStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VoteStore for PostgresVoteStore {
    async fn begin(&self) -> Result<Box<dyn VoteTransaction>, RepoError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::ReadCommitted), None)
            .await
            .map_err(map_db_err)?;

        Ok(Box::new(PostgresVoteTransaction { txn }))
    }
}

/// Rolls back on drop unless committed.
pub struct PostgresVoteTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl VoteTransaction for PostgresVoteTransaction {
    async fn current_vote(
        &mut self,
        user_id: i32,
        post_id: i32,
    ) -> Result<Option<VoteValue>, RepoError> {
        let row = VoteEntity::find_by_id((user_id, post_id))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(map_db_err)?;

        match row {
            Some(model) => VoteValue::try_from(model.value)
                .map(Some)
                .map_err(|e| RepoError::Query(format!("corrupt vote row: {e}"))),
            None => Ok(None),
        }
    }

    async fn insert_vote(&mut self, vote: Vote) -> Result<(), RepoError> {
        let model = vote::ActiveModel {
            user_id: Set(vote.user_id),
            post_id: Set(vote.post_id),
            value: Set(vote.value.as_i32()),
        };

        match VoteEntity::insert(model)
            .exec_without_returning(&self.txn)
            .await
            .map_err(map_db_err)
        {
            Ok(_) => Ok(()),
            // Somebody else inserted this (user, post) first.
            Err(RepoError::Constraint(detail)) => Err(RepoError::Conflict(detail)),
            Err(err) => Err(err),
        }
    }

    async fn update_vote(&mut self, vote: Vote) -> Result<(), RepoError> {
        let result = VoteEntity::update_many()
            .col_expr(vote::Column::Value, Expr::value(vote.value.as_i32()))
            .filter(vote::Column::UserId.eq(vote.user_id))
            .filter(vote::Column::PostId.eq(vote.post_id))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn adjust_points(&mut self, post_id: i32, delta: i32) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(
                post::Column::Points,
                Expr::col(post::Column::Points).add(delta),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.txn.commit().await.map_err(map_db_err)
    }
}
