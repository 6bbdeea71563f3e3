use std::sync::Arc;

use crate::domain::{LoginLookup, NewUser, Registration, User, validate_new_password};
use crate::error::{DomainError, FieldError, RepoError};
use crate::ports::{Mailer, PasswordService, ResetTokenStore, UserRepository};

/// Registration, login and password reset.
///
/// Session handling is left to the caller: a successful `register`, `login`
/// or `change_password` returns the user that should be logged in.
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    reset_tokens: Arc<dyn ResetTokenStore>,
    mailer: Arc<dyn Mailer>,
    frontend_url: String,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        reset_tokens: Arc<dyn ResetTokenStore>,
        mailer: Arc<dyn Mailer>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            passwords,
            reset_tokens,
            mailer,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<User, DomainError> {
        let errors = registration.validate();
        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        let password_hash = self
            .passwords
            .hash(&registration.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let created = self
            .users
            .create(NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User registered");
                Ok(user)
            }
            Err(RepoError::Constraint(detail)) => {
                tracing::debug!(%detail, "Registration hit a unique constraint");
                Err(DomainError::Conflict(FieldError::new(
                    "username",
                    "Username/Email already exists",
                )))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        let found = match LoginLookup::parse(username_or_email) {
            LoginLookup::Email(email) => self.users.find_by_email(email).await?,
            LoginLookup::Username(username) => self.users.find_by_username(username).await?,
        };

        let user = found.ok_or_else(|| {
            DomainError::field("usernameOrEmail", "that username does not exist")
        })?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            return Err(DomainError::field("password", "password is wrong"));
        }

        Ok(user)
    }

    /// Email a reset link. `Ok(false)` if no account uses this address.
    pub async fn forgot_password(&self, email: &str) -> Result<bool, DomainError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(false);
        };

        let token = self
            .reset_tokens
            .issue(user.id)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let html = format!(
            r#"<a href="{}/change-password/{}">reset password</a>"#,
            self.frontend_url, token
        );

        match self.mailer.send(&user.email, &html, "Forgot Password").await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Failed to send reset email");
                Ok(false)
            }
        }
    }

    /// Consume a reset token and set a new password.
    pub async fn change_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<User, DomainError> {
        validate_new_password(new_password)?;

        let user_id = self
            .reset_tokens
            .lookup(token)
            .await
            .ok_or_else(|| DomainError::field("token", "token expired"))?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::field("token", "user no longer exists"))?;

        let password_hash = self
            .passwords
            .hash(new_password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        self.users.update_password(user.id, &password_hash).await?;

        if let Err(e) = self.reset_tokens.revoke(token).await {
            tracing::warn!(user_id = user.id, error = %e, "Failed to revoke reset token");
        }

        tracing::info!(user_id = user.id, "Password changed");
        Ok(User {
            password_hash,
            ..user
        })
    }

    pub async fn me(&self, viewer: Option<i32>) -> Result<Option<User>, DomainError> {
        match viewer {
            Some(id) => Ok(self.users.find_by_id(id).await?),
            None => Ok(None),
        }
    }

    pub async fn user(&self, id: i32, viewer: Option<i32>) -> Result<Option<User>, DomainError> {
        let user = self.users.find_by_id(id).await?;
        Ok(user.map(|u| u.visible_to(viewer)))
    }

    pub async fn users(&self, viewer: Option<i32>) -> Result<Vec<User>, DomainError> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(|u| u.visible_to(viewer)).collect())
    }

    /// Users may only delete their own account.
    pub async fn delete_user(&self, viewer: Option<i32>, id: i32) -> Result<bool, DomainError> {
        let user_id = viewer.ok_or(DomainError::Unauthenticated)?;
        if user_id != id {
            return Err(DomainError::Forbidden);
        }

        match self.users.delete(id).await {
            Ok(()) => {
                tracing::info!(user_id = id, "User deleted");
                Ok(true)
            }
            Err(RepoError::NotFound) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
