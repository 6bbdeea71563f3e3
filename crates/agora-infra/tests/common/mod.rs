#![allow(dead_code)]

use std::sync::Arc;

use agora_core::domain::{NewPost, NewUser, Post, User};
use agora_core::ports::{BaseRepository, PostRepository, UserRepository};
use agora_infra::InMemoryStore;

pub async fn user(store: &InMemoryStore, name: &str) -> User {
    UserRepository::create(
        store,
        NewUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap()
}

pub async fn post(store: &InMemoryStore, creator: &User, title: &str) -> Post {
    PostRepository::create(
        store,
        NewPost {
            title: title.to_string(),
            text: format!("{title} body"),
            creator_id: creator.id,
        },
    )
    .await
    .unwrap()
}

pub async fn points(store: &InMemoryStore, post_id: i32) -> i32 {
    BaseRepository::<Post, i32>::find_by_id(store, post_id)
        .await
        .unwrap()
        .unwrap()
        .points
}

pub fn shared(store: &InMemoryStore) -> Arc<InMemoryStore> {
    Arc::new(store.clone())
}
