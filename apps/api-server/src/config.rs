//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use agora_infra::DatabaseConfig;

/// Cookie session settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl: Duration,
    /// Mark the cookie `Secure`; on in production.
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "qid".to_string(),
            ttl: Duration::from_secs(365 * 24 * 60 * 60),
            secure: false,
        }
    }
}

/// Outgoing mail relay. Without one, mail is only logged.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub redis_url: Option<String>,
    pub session: SessionConfig,
    /// Base URL of the web client, used in password reset links.
    pub frontend_url: String,
    pub smtp: Option<SmtpSettings>,
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|v| v.trim().parse().ok())
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database = non_empty("DATABASE_URL").map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = parse(lookup("DB_MAX_CONNECTIONS")) {
                config.max_connections = max;
            }
            if let Some(min) = parse(lookup("DB_MIN_CONNECTIONS")) {
                config.min_connections = min;
            }
            config
        });

        let production = lookup("RUST_ENV")
            .map(|v| v == "production" || v == "prod")
            .unwrap_or(false);

        let mut session = SessionConfig {
            secure: production,
            ..SessionConfig::default()
        };
        if let Some(name) = non_empty("SESSION_COOKIE_NAME") {
            session.cookie_name = name;
        }
        if let Some(days) = parse::<u64>(lookup("SESSION_TTL_DAYS")) {
            session.ttl = Duration::from_secs(days * 24 * 60 * 60);
        }

        let smtp = non_empty("SMTP_HOST").map(|host| SmtpSettings {
            host,
            port: parse(lookup("SMTP_PORT")).unwrap_or(587),
            username: non_empty("SMTP_USERNAME"),
            password: non_empty("SMTP_PASSWORD"),
            from: non_empty("MAIL_FROM")
                .unwrap_or_else(|| "Agora <no-reply@localhost>".to_string()),
        });

        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse(lookup("PORT")).unwrap_or(8080),
            database,
            redis_url: non_empty("REDIS_URL"),
            session,
            frontend_url: non_empty("FRONTEND_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            smtp,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert!(config.database.is_none());
        assert!(config.redis_url.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.session.cookie_name, "qid");
        assert_eq!(config.session.ttl.as_secs(), 365 * 86_400);
        assert!(!config.session.secure);
        assert_eq!(config.frontend_url, "http://localhost:3000");
    }

    #[test]
    fn test_database_pool_sizes() {
        let config = config(&[
            ("DATABASE_URL", "postgres://localhost/agora"),
            ("DB_MAX_CONNECTIONS", "7"),
            ("DB_MIN_CONNECTIONS", "not-a-number"),
        ]);

        let db = config.database.unwrap();
        assert_eq!(db.url, "postgres://localhost/agora");
        assert_eq!(db.max_connections, 7);
        assert_eq!(db.min_connections, 2);
    }

    #[test]
    fn test_production_sessions_are_secure() {
        let config = config(&[
            ("RUST_ENV", "production"),
            ("SESSION_COOKIE_NAME", "sid"),
            ("SESSION_TTL_DAYS", "1"),
        ]);

        assert!(config.session.secure);
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.ttl.as_secs(), 86_400);
    }

    #[test]
    fn test_smtp_needs_a_host() {
        assert!(config(&[("SMTP_USERNAME", "bob")]).smtp.is_none());

        let smtp = config(&[("SMTP_HOST", "smtp.example.com"), ("MAIL_FROM", "a@b.c")])
            .smtp
            .unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from, "a@b.c");
        assert!(smtp.username.is_none());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config(&[("DATABASE_URL", " "), ("REDIS_URL", "")]);
        assert!(config.database.is_none());
        assert!(config.redis_url.is_none());
    }
}
