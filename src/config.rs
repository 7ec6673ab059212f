use std::{env, time::Duration};

/// AppConfig
///
/// Holds the application's entire configuration state. Immutable once loaded and
/// pulled into handlers through `FromRef`, like the rest of `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and configuration strictness.
    pub env: Env,
    // SQLite connection string.
    pub db_url: String,
    // Identity provider tenant, e.g. `my-tenant.us.auth0.com`.
    pub auth_domain: String,
    // Audience every accepted token must be issued for.
    pub api_audience: String,
    // Upper bound on a single key-set fetch.
    pub jwks_timeout: Duration,
    // Drop, recreate and seed the drink table on startup.
    pub reset_db: bool,
    pub bind_addr: String,
}

/// Env
///
/// Local runs get fallbacks for everything; production refuses to start without
/// explicit database and identity provider settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_DB_URL: &str = "sqlite://database.db?mode=rwc";
const DEFAULT_AUTH_DOMAIN: &str = "dev-drinks.us.auth0.com";
const DEFAULT_AUDIENCE: &str = "drinks";
const DEFAULT_JWKS_TIMEOUT_SECS: u64 = 5;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking configuration for test state setup: in-memory database, local
    /// fallbacks for the identity provider.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: "sqlite::memory:".to_string(),
            auth_domain: DEFAULT_AUTH_DOMAIN.to_string(),
            api_audience: DEFAULT_AUDIENCE.to_string(),
            jwks_timeout: Duration::from_secs(DEFAULT_JWKS_TIMEOUT_SECS),
            reset_db: false,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables, failing fast.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL`, `AUTH0_DOMAIN` or `API_AUDIENCE` is
    /// unset, and in any environment when `JWKS_TIMEOUT_SECS` or `DB_RESET` is not
    /// parseable. The service must not start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwks_timeout = env::var("JWKS_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .expect("FATAL: JWKS_TIMEOUT_SECS must be a whole number of seconds")
            })
            .unwrap_or(DEFAULT_JWKS_TIMEOUT_SECS);

        let reset_db = env::var("DB_RESET")
            .map(|raw| {
                raw.parse::<bool>()
                    .expect("FATAL: DB_RESET must be 'true' or 'false'")
            })
            // Local development starts from a freshly seeded table unless told otherwise.
            .unwrap_or(env == Env::Local);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DB_URL.to_string()),
                auth_domain: env::var("AUTH0_DOMAIN")
                    .unwrap_or_else(|_| DEFAULT_AUTH_DOMAIN.to_string()),
                api_audience: env::var("API_AUDIENCE")
                    .unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string()),
                jwks_timeout: Duration::from_secs(jwks_timeout),
                reset_db,
                bind_addr,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                auth_domain: env::var("AUTH0_DOMAIN")
                    .expect("FATAL: AUTH0_DOMAIN required in prod"),
                api_audience: env::var("API_AUDIENCE")
                    .expect("FATAL: API_AUDIENCE required in prod"),
                jwks_timeout: Duration::from_secs(jwks_timeout),
                reset_db,
                bind_addr,
            },
        }
    }

    /// Value every accepted token must carry in `iss`.
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.auth_domain)
    }

    /// Where the issuer publishes its signing keys.
    pub fn jwks_url(&self) -> String {
        format!("https://{}/.well-known/jwks.json", self.auth_domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issuer_and_key_set_url_derive_from_domain() {
        let config = AppConfig {
            auth_domain: "tenant.eu.auth0.com".to_string(),
            ..AppConfig::default()
        };
        assert_eq!(config.issuer(), "https://tenant.eu.auth0.com/");
        assert_eq!(
            config.jwks_url(),
            "https://tenant.eu.auth0.com/.well-known/jwks.json"
        );
    }
}
