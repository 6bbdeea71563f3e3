//! Sample content for local development: one user and a handful of posts
//! spread over the last few hours so the feed has something to page through.

use argon2::Argon2;
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DbBackend, Statement, Value};

const SEED_USERNAME: &str = "agora";
const SEED_EMAIL: &str = "agora@example.com";
const SEED_PASSWORD: &str = "agora-dev-password";

const SEED_POSTS: &[(&str, &str)] = &[
    ("Welcome to Agora", "Say hello and tell us what you're working on."),
    ("Posting guidelines", "Be kind, stay on topic, and vote on what you find useful."),
    ("What are you reading this week?", "Books, papers, blog posts. Anything goes."),
    ("Show your side project", "Share a link and a sentence about what it does."),
    ("Favourite terminal tools", "Which command line tools can you not live without?"),
    ("Async Rust tips", "Collected advice on lifetimes across await points."),
    ("Postgres indexing questions", "When does a partial index beat a composite one?"),
    ("Weekend plans", "Anyone hiking, building, or just resting?"),
    ("Feature requests", "Ideas for the forum itself go here."),
    ("Bug reports", "Found something broken? Describe how to reproduce it."),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(SEED_PASSWORD.as_bytes(), &salt)
            .map_err(|e| DbErr::Custom(format!("hashing seed password: {e}")))?
            .to_string();

        db.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             ON CONFLICT DO NOTHING",
            [
                Value::from(SEED_USERNAME),
                Value::from(SEED_EMAIL),
                Value::from(password_hash),
            ],
        ))
        .await?;

        let row = db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "SELECT id FROM users WHERE username = $1",
                [Value::from(SEED_USERNAME)],
            ))
            .await?
            .ok_or_else(|| DbErr::Custom("seed user missing after insert".to_owned()))?;
        let creator_id: i32 = row.try_get("", "id")?;

        // Oldest first, one hour apart, newest one hour ago.
        let total = SEED_POSTS.len() as i32;
        for (i, (title, text)) in SEED_POSTS.iter().enumerate() {
            let hours_ago = total - i as i32;
            db.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "INSERT INTO posts (title, text, creator_id, created_at, updated_at) \
                 VALUES ($1, $2, $3, NOW() - make_interval(hours => $4), \
                 NOW() - make_interval(hours => $4))",
                [
                    Value::from(*title),
                    Value::from(*text),
                    Value::from(creator_id),
                    Value::from(hours_ago),
                ],
            ))
            .await?;
        }

        tracing::info!(posts = SEED_POSTS.len(), "Seeded sample posts");
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Posts and votes go with the user.
        manager
            .get_connection()
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "DELETE FROM users WHERE username = $1",
                [Value::from(SEED_USERNAME)],
            ))
            .await?;
        Ok(())
    }
}
