mod common;

use agora_core::domain::{User, VoteOutcome};
use agora_core::error::DomainError;
use agora_core::ports::BaseRepository;
use agora_core::services::VoteLedger;
use agora_infra::InMemoryStore;
use proptest::prelude::*;

use common::{points, post, shared, user};

#[tokio::test]
async fn test_repeat_vote_is_idempotent() {
    let store = InMemoryStore::new();
    let alice = user(&store, "alice").await;
    let p = post(&store, &alice, "hello").await;
    let ledger = VoteLedger::new(shared(&store));

    assert_eq!(
        ledger.cast_vote(Some(alice.id), p.id, 1).await.unwrap(),
        VoteOutcome::Inserted
    );
    assert_eq!(
        ledger.cast_vote(Some(alice.id), p.id, 1).await.unwrap(),
        VoteOutcome::Unchanged
    );

    assert_eq!(points(&store, p.id).await, 1);
    assert_eq!(store.vote_count().await, 1);
}

#[tokio::test]
async fn test_flip_moves_score_by_two() {
    let store = InMemoryStore::new();
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bobby").await;
    let p = post(&store, &alice, "hello").await;
    let ledger = VoteLedger::new(shared(&store));

    ledger.cast_vote(Some(bob.id), p.id, 1).await.unwrap();
    let before = points(&store, p.id).await;

    ledger.cast_vote(Some(alice.id), p.id, 1).await.unwrap();
    assert_eq!(points(&store, p.id).await, before + 1);

    let outcome = ledger.cast_vote(Some(alice.id), p.id, -1).await.unwrap();
    assert_eq!(outcome, VoteOutcome::Flipped);
    assert_eq!(points(&store, p.id).await, before - 1);

    // And back again.
    ledger.cast_vote(Some(alice.id), p.id, 1).await.unwrap();
    assert_eq!(points(&store, p.id).await, before + 1);
}

#[tokio::test]
async fn test_rejected_votes_change_nothing() {
    let store = InMemoryStore::new();
    let alice = user(&store, "alice").await;
    let p = post(&store, &alice, "hello").await;
    let ledger = VoteLedger::new(shared(&store));

    for value in [0, 2, -7] {
        let err = ledger.cast_vote(Some(alice.id), p.id, value).await.unwrap_err();
        match err {
            DomainError::Validation(fields) => assert_eq!(fields[0].field, "value"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    assert!(matches!(
        ledger.cast_vote(None, p.id, 1).await,
        Err(DomainError::Unauthenticated)
    ));
    assert!(matches!(
        ledger.cast_vote(Some(alice.id), 999, 1).await,
        Err(DomainError::NotFound { id: 999, .. })
    ));

    assert_eq!(points(&store, p.id).await, 0);
    assert_eq!(store.vote_count().await, 0);
}

#[tokio::test]
async fn test_vote_from_deleted_account_is_unauthenticated() {
    let store = InMemoryStore::new();
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bobby").await;
    let p = post(&store, &alice, "hello").await;
    let ledger = VoteLedger::new(shared(&store));

    // Bob's account is gone but a session still names him.
    BaseRepository::<User, i32>::delete(&store, bob.id)
        .await
        .unwrap();

    assert!(matches!(
        ledger.cast_vote(Some(bob.id), p.id, 1).await,
        Err(DomainError::Unauthenticated)
    ));
    assert_eq!(points(&store, p.id).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_keep_score_consistent() {
    let store = InMemoryStore::new();
    let author = user(&store, "author").await;
    let p = post(&store, &author, "busy").await;

    let mut voters = Vec::new();
    for i in 0..16 {
        voters.push(user(&store, &format!("voter{i}")).await);
    }

    let ledger = std::sync::Arc::new(VoteLedger::new(shared(&store)));
    let mut handles = Vec::new();
    for (i, voter) in voters.iter().enumerate() {
        let ledger = ledger.clone();
        let (voter_id, post_id) = (voter.id, p.id);
        handles.push(tokio::spawn(async move {
            // Every voter races an upvote against a downvote of their own.
            let first = if i % 2 == 0 { 1 } else { -1 };
            let a = ledger.cast_vote(Some(voter_id), post_id, first);
            let b = ledger.cast_vote(Some(voter_id), post_id, -first);
            let (a, b) = tokio::join!(a, b);
            a.unwrap();
            b.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.vote_count().await, voters.len());
    assert_eq!(points(&store, p.id).await, store.vote_total(p.id).await);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn points_always_equal_sum_of_votes(
        votes in prop::collection::vec((0usize..4, 0usize..3, prop::bool::ANY), 1..40)
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = InMemoryStore::new();
            let mut users = Vec::new();
            for i in 0..4 {
                users.push(user(&store, &format!("user{i}")).await);
            }
            let mut posts = Vec::new();
            for i in 0..3 {
                posts.push(post(&store, &users[i], &format!("post{i}")).await);
            }

            let ledger = VoteLedger::new(shared(&store));
            for (u, p, up) in &votes {
                let value = if *up { 1 } else { -1 };
                ledger
                    .cast_vote(Some(users[*u].id), posts[*p].id, value)
                    .await
                    .unwrap();
            }

            for p in &posts {
                assert_eq!(points(&store, p.id).await, store.vote_total(p.id).await);
            }
        });
    }
}
