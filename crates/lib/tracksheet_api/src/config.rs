//! API server configuration.

use tracksheet_core::auth::jwt::{DEFAULT_SESSION_TTL_DAYS, resolve_jwt_secret};
use tracksheet_core::models::auth::Provider;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Session signing secret.
    pub jwt_secret: String,
    /// Session lifetime in days.
    pub session_ttl_days: i64,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
    /// Shared secrets for verifying provider assertions, one per enabled provider.
    pub federation_secrets: Vec<(Provider, String)>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                      | Default                                 |
    /// |-------------------------------|-----------------------------------------|
    /// | `BIND_ADDR`                   | `127.0.0.1:3100`                        |
    /// | `DATABASE_URL`                | `postgres://localhost:5432/tracksheet`  |
    /// | `JWT_SECRET` / `AUTH_SECRET`  | generated & persisted to file           |
    /// | `SESSION_TTL_DAYS`            | `30`                                    |
    /// | `SECURE_COOKIES`              | `false`                                 |
    /// | `FEDERATION_SECRET_GOOGLE`    | unset (provider disabled)               |
    /// | `FEDERATION_SECRET_GITHUB`    | unset (provider disabled)               |
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/tracksheet".into()),
            jwt_secret: resolve_jwt_secret(),
            session_ttl_days: std::env::var("SESSION_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|days: &i64| *days > 0)
                .unwrap_or(DEFAULT_SESSION_TTL_DAYS),
            secure_cookies: std::env::var("SECURE_COOKIES")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            federation_secrets: federation_secrets_from_env(),
        }
    }

    /// Fixed configuration for tests and local runs.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".into(),
            database_url: String::new(),
            jwt_secret: jwt_secret.to_string(),
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            secure_cookies: false,
            federation_secrets: Vec::new(),
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}

fn federation_secrets_from_env() -> Vec<(Provider, String)> {
    [
        (Provider::Google, "FEDERATION_SECRET_GOOGLE"),
        (Provider::Github, "FEDERATION_SECRET_GITHUB"),
    ]
    .into_iter()
    .filter_map(|(provider, var)| {
        std::env::var(var)
            .ok()
            .filter(|s| !s.is_empty())
            .map(|secret| (provider, secret))
    })
    .collect()
}
