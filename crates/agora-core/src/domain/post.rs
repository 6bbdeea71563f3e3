use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;
use super::vote::VoteValue;
use crate::error::FieldError;

/// Number of characters kept by [`Post::text_snippet`].
pub const SNIPPET_LEN: usize = 70;

/// Post record - a submission with an aggregate vote score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub text: String,
    /// Sum of all votes on this post, maintained by the vote ledger.
    pub points: i32,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Leading part of the body, cut on a character boundary.
    pub fn text_snippet(&self) -> &str {
        match self.text.char_indices().nth(SNIPPET_LEN) {
            Some((idx, _)) => &self.text[..idx],
            None => &self.text,
        }
    }
}

/// Data required to insert a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub text: String,
    pub creator_id: i32,
}

impl NewPost {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title cannot be empty"));
        }
        if self.text.trim().is_empty() {
            errors.push(FieldError::new("text", "text cannot be empty"));
        }
        errors
    }
}

/// A post joined with its creator and the viewer's own vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub post: Post,
    pub creator: User,
    pub vote_status: Option<VoteValue>,
}

/// Scrub everything `viewer` must not see from a post view.
pub fn redact(view: PostView, viewer: Option<i32>) -> PostView {
    PostView {
        creator: view.creator.visible_to(viewer),
        ..view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(creator_id: i32) -> PostView {
        let now = Utc::now();
        PostView {
            post: Post {
                id: 7,
                title: "hello".to_string(),
                text: "world".to_string(),
                points: 3,
                creator_id,
                created_at: now,
                updated_at: now,
            },
            creator: User {
                id: creator_id,
                username: "creator".to_string(),
                email: "creator@example.com".to_string(),
                password_hash: "hash".to_string(),
                created_at: now,
                updated_at: now,
            },
            vote_status: Some(VoteValue::Up),
        }
    }

    #[test]
    fn test_redact_keeps_email_for_creator() {
        let redacted = redact(view(4), Some(4));
        assert_eq!(redacted.creator.email, "creator@example.com");
    }

    #[test]
    fn test_redact_scrubs_email_for_others() {
        let redacted = redact(view(4), Some(5));
        assert_eq!(redacted.creator.email, "");
        assert_eq!(redacted.post.points, 3);
        assert_eq!(redacted.vote_status, Some(VoteValue::Up));

        assert_eq!(redact(view(4), None).creator.email, "");
    }

    #[test]
    fn test_text_snippet() {
        let mut post = view(1).post;
        assert_eq!(post.text_snippet(), "world");

        post.text = "é".repeat(100);
        assert_eq!(post.text_snippet().chars().count(), SNIPPET_LEN);
    }

    #[test]
    fn test_new_post_validation() {
        let input = NewPost {
            title: "  ".to_string(),
            text: "body".to_string(),
            creator_id: 1,
        };
        let errors = input.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "title");
    }
}
