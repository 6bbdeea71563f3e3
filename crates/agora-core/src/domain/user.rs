use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Minimum trimmed length for usernames and passwords.
pub const MIN_CREDENTIAL_LEN: usize = 5;

/// User record - a registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns the user as `viewer` is allowed to see it.
    ///
    /// The email address is only visible to its owner; everyone else gets an
    /// empty string.
    pub fn visible_to(mut self, viewer: Option<i32>) -> Self {
        if viewer != Some(self.id) {
            self.email.clear();
        }
        self
    }
}

/// Data required to insert a user. The id and timestamps come from storage.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Registration input as submitted by a client.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Check the registration rules, collecting every violation.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.username.trim().chars().count() < MIN_CREDENTIAL_LEN {
            errors.push(FieldError::new(
                "username",
                "Username length must be at least 5 characters",
            ));
        }
        if self.username.contains('@') {
            errors.push(FieldError::new(
                "username",
                "Username cannot have '@' character",
            ));
        }
        if self.password.trim().chars().count() < MIN_CREDENTIAL_LEN {
            errors.push(FieldError::new(
                "password",
                "Password length must be at least 5 characters",
            ));
        }
        if !self.email.contains('@') {
            errors.push(FieldError::new("email", "Please enter the email correctly"));
        }

        errors
    }
}

/// How a login identifier should be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginLookup<'a> {
    Email(&'a str),
    Username(&'a str),
}

impl<'a> LoginLookup<'a> {
    pub fn parse(username_or_email: &'a str) -> Self {
        if username_or_email.contains('@') {
            Self::Email(username_or_email)
        } else {
            Self::Username(username_or_email)
        }
    }
}

/// Validate a replacement password.
pub fn validate_new_password(password: &str) -> Result<(), FieldError> {
    if password.trim().chars().count() < MIN_CREDENTIAL_LEN {
        return Err(FieldError::new(
            "newPassword",
            "Password length must be at least 5 characters",
        ));
    }
    Ok(())
}
