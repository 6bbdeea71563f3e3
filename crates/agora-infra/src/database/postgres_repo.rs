//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbBackend, DbConn, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, Set, Statement, TransactionTrait, Value,
};

use agora_core::domain::{NewPost, NewUser, Post, PostView, User, VoteValue};
use agora_core::error::RepoError;
use agora_core::ports::{BaseRepository, FeedQuery, PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL user repository.
pub struct PostgresUserRepository {
    db: DbConn,
}

impl PostgresUserRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

#[async_trait]
impl BaseRepository<User, i32> for PostgresUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(result.map(Into::into))
    }

    /// The user's posts and votes go with them through `ON DELETE CASCADE`.
    /// Their votes on other people's posts are taken back out of the scores
    /// first, in the same transaction.
    async fn delete(&self, id: i32) -> Result<(), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE posts p
               SET points = p.points - v.value
               FROM votes v
               WHERE v.post_id = p.id AND v.user_id = $1"#,
            [Value::from(id)],
        ))
        .await
        .map_err(map_db_err)?;

        let result = UserEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let now = Utc::now();
        let model = user::ActiveModel {
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(
                user::Column::UpdatedAt,
                Expr::value(Utc::now().fixed_offset()),
            )
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Columns shared by the feed and single-post queries: the post, its creator
/// and the viewer's vote (`$1`, may be NULL).
const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.points, p.creator_id, p.created_at, p.updated_at,
           u.username AS creator_username,
           u.email AS creator_email,
           u.password_hash AS creator_password_hash,
           u.created_at AS creator_created_at,
           u.updated_at AS creator_updated_at,
           (SELECT v.value FROM votes v
             WHERE v.user_id = $1 AND v.post_id = p.id) AS vote_status
    FROM posts p
    JOIN users u ON u.id = p.creator_id
"#;

/// One row of [`POST_VIEW_SELECT`].
#[derive(Debug, FromQueryResult)]
pub(crate) struct PostViewRow {
    id: i32,
    title: String,
    text: String,
    points: i32,
    creator_id: i32,
    created_at: sea_orm::prelude::DateTimeWithTimeZone,
    updated_at: sea_orm::prelude::DateTimeWithTimeZone,
    creator_username: String,
    creator_email: String,
    creator_password_hash: String,
    creator_created_at: sea_orm::prelude::DateTimeWithTimeZone,
    creator_updated_at: sea_orm::prelude::DateTimeWithTimeZone,
    vote_status: Option<i32>,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let vote_status = row.vote_status.and_then(|v| VoteValue::try_from(v).ok());
        Self {
            post: Post {
                id: row.id,
                title: row.title,
                text: row.text,
                points: row.points,
                creator_id: row.creator_id,
                created_at: row.created_at.into(),
                updated_at: row.updated_at.into(),
            },
            creator: User {
                id: row.creator_id,
                username: row.creator_username,
                email: row.creator_email,
                password_hash: row.creator_password_hash,
                created_at: row.creator_created_at.into(),
                updated_at: row.creator_updated_at.into(),
            },
            vote_status,
        }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let now = Utc::now();
        let model = post::ActiveModel {
            title: Set(post.title),
            text: Set(post.text),
            points: Set(0),
            creator_id: Set(post.creator_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update_title(&self, id: i32, title: &str) -> Result<Option<Post>, RepoError> {
        let Some(existing) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(None);
        };

        let mut active: post::ActiveModel = existing.into();
        active.title = Set(title.to_string());
        active.updated_at = Set(Utc::now().into());
        let model = active.update(&self.db).await.map_err(map_db_err)?;

        Ok(Some(model.into()))
    }

    async fn find_view(
        &self,
        id: i32,
        viewer: Option<i32>,
    ) -> Result<Option<PostView>, RepoError> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = $2");
        let row = PostViewRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [Value::from(viewer), Value::from(id)],
        ))
        .one(&self.db)
        .await
        .map_err(map_db_err)?;

        Ok(row.map(Into::into))
    }

    async fn feed(&self, query: FeedQuery) -> Result<Vec<PostView>, RepoError> {
        // A NULL id on the cursor skips every post at that instant.
        let sql = format!(
            "{POST_VIEW_SELECT}
             WHERE $2::timestamptz IS NULL
                OR p.created_at < $2
                OR (p.created_at = $2 AND p.id < $4)
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT $3"
        );

        let rows = PostViewRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [
                Value::from(query.viewer),
                Value::from(query.cursor.map(|c| c.created_at())),
                Value::from(query.limit as i64),
                Value::from(query.cursor.and_then(|c| c.id())),
            ],
        ))
        .all(&self.db)
        .await
        .map_err(map_db_err)?;

        tracing::debug!(
            rows = rows.len(),
            limit = query.limit,
            has_cursor = query.cursor.is_some(),
            "Feed page fetched"
        );

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
