use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use sea_orm::{
    DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult, Statement, Value,
};

use agora_core::domain::{Cursor, Post, VoteOutcome, VoteValue};
use agora_core::error::DomainError;
use agora_core::ports::{BaseRepository, FeedQuery, PostRepository};
use agora_core::services::VoteLedger;

use crate::database::entity::{post, vote};
use crate::database::{PostgresPostRepository, PostgresVoteStore};

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Every data statement the connection ran, in order. Transaction control
/// is left out.
fn executed(db: DatabaseConnection) -> Vec<Statement> {
    db.into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().to_vec())
        .filter(|stmt| {
            ["SELECT", "INSERT", "UPDATE", "DELETE"]
                .iter()
                .any(|verb| stmt.sql.trim_start().starts_with(verb))
        })
        .collect()
}

fn values(stmt: &Statement) -> Vec<Value> {
    stmt.values
        .as_ref()
        .map(|values| values.0.clone())
        .unwrap_or_default()
}

fn view_row(id: i32, creator_id: i32, vote_status: Option<i32>) -> BTreeMap<&'static str, Value> {
    let at = (Utc::now() - TimeDelta::minutes(id as i64)).fixed_offset();
    BTreeMap::from([
        ("id", Value::from(id)),
        ("title", Value::from(format!("post {id}"))),
        ("text", Value::from("body")),
        ("points", Value::from(3)),
        ("creator_id", Value::from(creator_id)),
        ("created_at", Value::from(at)),
        ("updated_at", Value::from(at)),
        ("creator_username", Value::from("creator")),
        ("creator_email", Value::from("creator@example.com")),
        ("creator_password_hash", Value::from("hash")),
        ("creator_created_at", Value::from(at)),
        ("creator_updated_at", Value::from(at)),
        ("vote_status", Value::from(vote_status)),
    ])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post::Model {
            id: 12,
            title: "Test Post".to_owned(),
            text: "Content".to_owned(),
            points: -4,
            creator_id: 3,
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(12).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.points, -4);
    assert_eq!(post.creator_id, 3);
}

#[tokio::test]
async fn test_feed_rows_carry_creator_and_vote_status() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![view_row(1, 7, Some(-1)), view_row(2, 8, None)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let views = repo
        .feed(FeedQuery {
            cursor: None,
            limit: 11,
            viewer: Some(7),
        })
        .await
        .unwrap();

    assert_eq!(views.len(), 2);
    assert_eq!(views[0].post.id, 1);
    assert_eq!(views[0].creator.id, 7);
    assert_eq!(views[0].creator.username, "creator");
    assert_eq!(views[0].vote_status, Some(VoteValue::Down));
    assert_eq!(views[1].vote_status, None);
}

#[tokio::test]
async fn test_feed_keyset_breaks_ties_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<BTreeMap<&'static str, Value>>::new()])
        .into_connection();
    let at = Utc.timestamp_micros(1_600_872_884_621_123).unwrap();

    let repo = PostgresPostRepository::new(db);
    repo
        .feed(FeedQuery {
            cursor: Some(Cursor::new(at, 17)),
            limit: 3,
            viewer: None,
        })
        .await
        .unwrap();

    let stmts = executed(repo.db);
    assert_eq!(stmts.len(), 1);
    assert!(stmts[0].sql.contains("p.created_at = $2 AND p.id < $4"));
    assert!(stmts[0].sql.contains("ORDER BY p.created_at DESC, p.id DESC"));
    assert_eq!(values(&stmts[0])[3], Value::from(Some(17)));
}

#[tokio::test]
async fn test_first_vote_through_postgres_store() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<vote::Model>::new()])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let store = Arc::new(PostgresVoteStore::new(db));
    let ledger = VoteLedger::new(store.clone());
    let outcome = ledger.cast_vote(Some(2), 5, 1).await.unwrap();
    assert_eq!(outcome, VoteOutcome::Inserted);

    drop(ledger);
    let db = Arc::try_unwrap(store).ok().expect("ledger dropped").db;
    let stmts = executed(db);
    assert_eq!(stmts.len(), 3);

    // The existing vote is read under a row lock.
    assert!(stmts[0].sql.starts_with("SELECT"));
    assert!(stmts[0].sql.ends_with("FOR UPDATE"), "{}", stmts[0].sql);

    assert!(stmts[1].sql.starts_with(r#"INSERT INTO "votes""#));
    assert_eq!(
        values(&stmts[1]),
        vec![Value::from(2), Value::from(5), Value::from(1)]
    );

    // The score moves relative to its stored value, never to a precomputed one.
    assert!(
        stmts[2].sql.contains(r#"SET "points" = "points" + $1"#),
        "{}",
        stmts[2].sql
    );
    assert_eq!(values(&stmts[2]), vec![Value::from(1), Value::from(5)]);
}

#[tokio::test]
async fn test_flip_through_postgres_store() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![vote::Model {
            user_id: 2,
            post_id: 5,
            value: 1,
        }]])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let store = Arc::new(PostgresVoteStore::new(db));
    let ledger = VoteLedger::new(store.clone());
    let outcome = ledger.cast_vote(Some(2), 5, -1).await.unwrap();
    assert_eq!(outcome, VoteOutcome::Flipped);

    drop(ledger);
    let db = Arc::try_unwrap(store).ok().expect("ledger dropped").db;
    let stmts = executed(db);
    assert_eq!(stmts.len(), 3);
    assert!(stmts[0].sql.ends_with("FOR UPDATE"));

    assert!(stmts[1].sql.starts_with(r#"UPDATE "votes" SET "value" = $1"#));
    assert_eq!(values(&stmts[1])[0], Value::from(-1));

    assert!(stmts[2].sql.contains(r#"SET "points" = "points" + $1"#));
    assert_eq!(values(&stmts[2]), vec![Value::from(-2), Value::from(5)]);
}

#[tokio::test]
async fn test_repeated_vote_writes_nothing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![vote::Model {
            user_id: 2,
            post_id: 5,
            value: 1,
        }]])
        .into_connection();

    let store = Arc::new(PostgresVoteStore::new(db));
    let ledger = VoteLedger::new(store.clone());
    let outcome = ledger.cast_vote(Some(2), 5, 1).await.unwrap();
    assert_eq!(outcome, VoteOutcome::Unchanged);

    drop(ledger);
    let db = Arc::try_unwrap(store).ok().expect("ledger dropped").db;
    let stmts = executed(db);
    assert_eq!(stmts.len(), 1);
    assert!(stmts[0].sql.starts_with("SELECT"));
}

#[tokio::test]
async fn test_vote_on_vanished_post_is_not_found() {
    // The vote row is written but the score update matches no post.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<vote::Model>::new()])
        .append_exec_results([exec(1), exec(0)])
        .into_connection();

    let ledger = VoteLedger::new(Arc::new(PostgresVoteStore::new(db)));
    let err = ledger.cast_vote(Some(2), 99, 1).await.unwrap_err();

    assert!(matches!(
        err,
        DomainError::NotFound {
            entity_type: "post",
            id: 99
        }
    ));
}
