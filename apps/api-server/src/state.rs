//! Application state - shared across all handlers and resolvers.

use std::sync::Arc;

use agora_core::ports::{Cache, Mailer, PostRepository, SessionStore, UserRepository, VoteStore};
use agora_core::services::{AccountService, FeedPaginator, PostService, VoteLedger};
use agora_infra::{
    Argon2PasswordService, CacheResetTokenStore, CacheSessionStore, InMemoryCache, InMemoryStore,
    LogMailer,
};

use crate::config::{AppConfig, SessionConfig};

/// The storage ports, all backed by the same database.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub votes: Arc<dyn VoteStore>,
    /// Reported by the health check.
    pub backend: &'static str,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            votes: store,
            backend: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &agora_infra::DatabaseConfig) -> Result<Self, String> {
        use agora_infra::{
            PostgresPostRepository, PostgresUserRepository, PostgresVoteStore, connect,
        };
        use migration::{Migrator, MigratorTrait};

        let conn = connect(config).await.map_err(|e| e.to_string())?;
        Migrator::up(&conn, None)
            .await
            .map_err(|e| format!("migrations failed: {e}"))?;

        Ok(Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            votes: Arc::new(PostgresVoteStore::new(conn)),
            backend: "postgres",
        })
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<VoteLedger>,
    pub feed: Arc<FeedPaginator>,
    pub posts: Arc<PostService>,
    pub accounts: Arc<AccountService>,
    pub sessions: Arc<dyn SessionStore>,
    pub session: SessionConfig,
    pub backend: &'static str,
}

impl AppState {
    /// Build the application state, falling back to in-memory adapters for
    /// every external service that is not configured or not reachable.
    pub async fn new(config: &AppConfig) -> Self {
        let repos = Self::repositories(config).await;
        let cache = Self::cache(config).await;
        let mailer = Self::mailer(config);

        let state = Self::from_parts(
            repos,
            cache,
            mailer,
            config.session.clone(),
            &config.frontend_url,
        );
        tracing::info!(backend = state.backend, "Application state initialized");
        state
    }

    /// Wire the services over the given adapters.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        mailer: Arc<dyn Mailer>,
        session: SessionConfig,
        frontend_url: &str,
    ) -> Self {
        let sessions: Arc<dyn SessionStore> =
            Arc::new(CacheSessionStore::new(cache.clone(), session.ttl));

        let accounts = AccountService::new(
            repos.users.clone(),
            Arc::new(Argon2PasswordService::new()),
            Arc::new(CacheResetTokenStore::new(cache)),
            mailer,
            frontend_url,
        );

        Self {
            ledger: Arc::new(VoteLedger::new(repos.votes.clone())),
            feed: Arc::new(FeedPaginator::new(repos.posts.clone())),
            posts: Arc::new(PostService::new(repos.posts.clone())),
            accounts: Arc::new(accounts),
            sessions,
            session,
            backend: repos.backend,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(config: &AppConfig) -> Repositories {
        let Some(db) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Repositories::in_memory();
        };

        match Repositories::postgres(db).await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::error!(error = %e, "Failed to set up database. Using in-memory fallback.");
                Repositories::in_memory()
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(config: &AppConfig) -> Repositories {
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without the postgres feature");
        }
        Repositories::in_memory()
    }

    #[cfg(feature = "redis")]
    async fn cache(config: &AppConfig) -> Arc<dyn Cache> {
        use agora_infra::{RedisCache, RedisConfig};

        let Some(url) = &config.redis_url else {
            tracing::warn!("REDIS_URL not set. Sessions are kept in memory.");
            return Arc::new(InMemoryCache::new());
        };

        match RedisCache::new(&RedisConfig::new(url.clone())).await {
            Ok(cache) => Arc::new(cache),
            Err(e) => {
                tracing::error!(error = %e, "Redis unavailable. Sessions are kept in memory.");
                Arc::new(InMemoryCache::new())
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn cache(config: &AppConfig) -> Arc<dyn Cache> {
        if config.redis_url.is_some() {
            tracing::warn!("REDIS_URL ignored: built without the redis feature");
        }
        Arc::new(InMemoryCache::new())
    }

    #[cfg(feature = "mail")]
    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        use agora_infra::{SmtpConfig, SmtpMailer};

        let Some(smtp) = &config.smtp else {
            tracing::warn!("SMTP_HOST not set. Outgoing mail is only logged.");
            return Arc::new(LogMailer);
        };

        let mut settings = SmtpConfig::new(smtp.host.clone(), smtp.from.clone());
        settings.port = smtp.port;
        if let (Some(user), Some(pass)) = (&smtp.username, &smtp.password) {
            settings = settings.with_credentials(user.clone(), pass.clone());
        }

        match SmtpMailer::new(&settings) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                tracing::error!(error = %e, "Invalid SMTP settings. Outgoing mail is only logged.");
                Arc::new(LogMailer)
            }
        }
    }

    #[cfg(not(feature = "mail"))]
    fn mailer(config: &AppConfig) -> Arc<dyn Mailer> {
        if config.smtp.is_some() {
            tracing::warn!("SMTP_HOST ignored: built without the mail feature");
        }
        Arc::new(LogMailer)
    }

    /// In-memory state for tests.
    #[cfg(test)]
    pub fn for_tests(mailer: Arc<dyn Mailer>) -> Self {
        Self::from_parts(
            Repositories::in_memory(),
            Arc::new(InMemoryCache::new()),
            mailer,
            SessionConfig::default(),
            "http://localhost:3000",
        )
    }
}
