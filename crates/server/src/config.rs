//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `RATINGS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `RATINGS_BASE_URL` - Public URL of the API
//! - `RATINGS_SESSION_SECRET` - Session signing secret (min 64 chars, high entropy)
//!
//! ## Optional
//! - `RATINGS_HOST` - Bind address (default: 127.0.0.1)
//! - `RATINGS_PORT` - Listen port (default: 3000)
//! - `RATINGS_CALLER_CACHE_TTL_SECS` - How long a resolved caller role is reused (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.1)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tower_sessions::cookie::Key;

/// Signing keys are derived from the first 64 bytes of the secret.
const MIN_SESSION_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Key used to sign the session cookie.
#[derive(Clone)]
pub struct SessionKey(Key);

impl SessionKey {
    /// Derive the signing key from a validated secret.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InsecureSecret` if the secret is shorter than
    /// 64 bytes.
    pub fn from_secret(secret: &SecretString, var_name: &str) -> Result<Self, ConfigError> {
        Key::try_from(secret.expose_secret().as_bytes())
            .map(Self)
            .map_err(|e| ConfigError::InsecureSecret(var_name.to_string(), e.to_string()))
    }

    #[must_use]
    pub fn key(&self) -> Key {
        self.0.clone()
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Store Ratings server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Session cookie signing key, derived from `RATINGS_SESSION_SECRET`
    pub session_key: SessionKey,
    /// Lifetime of a cached caller role
    pub caller_cache_ttl: Duration,
    /// Error tracking configuration
    pub sentry: SentryConfig,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
}

/// Sentry configuration. Sentry is disabled when `dsn` is `None`.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("RATINGS_DATABASE_URL")?;
        let host = parse_env::<IpAddr>("RATINGS_HOST", "127.0.0.1")?;
        let port = parse_env::<u16>("RATINGS_PORT", "3000")?;
        let base_url = get_required_env("RATINGS_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("RATINGS_BASE_URL".to_string(), e.to_string()))?;
        let session_secret = get_validated_secret("RATINGS_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "RATINGS_SESSION_SECRET")?;
        let session_key = SessionKey::from_secret(&session_secret, "RATINGS_SESSION_SECRET")?;
        let caller_cache_ttl =
            Duration::from_secs(parse_env::<u64>("RATINGS_CALLER_CACHE_TTL_SECS", "30")?);

        let sentry = SentryConfig::from_env()?;
        let json_logs = get_optional_env("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_key,
            caller_cache_ttl,
            sentry,
            json_logs,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies must be marked `Secure`.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SentryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dsn: get_optional_env("SENTRY_DSN").filter(|v| !v.is_empty()),
            environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.1")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
const TEST_SESSION_SECRET: &str =
    "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6eH8%jD1(vG4)sF7+oI2=hE5~tR9?kM3wQ";

/// Configuration for unit tests; nothing is read from the environment.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("postgres://localhost/ratings_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        session_key: SessionKey::from_secret(&SecretString::from(TEST_SESSION_SECRET), "TEST")
            .unwrap(),
        caller_cache_ttl: Duration::from_secs(30),
        sentry: SentryConfig {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
            traces_sample_rate: 0.1,
        },
        json_logs: false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-session-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"ab".repeat(20), "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_validate_session_secret_length() {
        let short = SecretString::from("short");
        assert!(validate_session_secret(&short, "TEST_SESSION").is_err());
        let just_short = SecretString::from("a".repeat(63));
        assert!(validate_session_secret(&just_short, "TEST_SESSION").is_err());
        let long = SecretString::from("a".repeat(64));
        assert!(validate_session_secret(&long, "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_session_key_needs_64_bytes() {
        let secret = SecretString::from(TEST_SESSION_SECRET);
        assert!(SessionKey::from_secret(&secret, "TEST_SESSION").is_ok());

        let short = SecretString::from(&TEST_SESSION_SECRET[..32]);
        let err = SessionKey::from_secret(&short, "TEST_SESSION").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(key, _) if key == "TEST_SESSION"));
    }

    #[test]
    fn test_session_key_debug_is_redacted() {
        let config = test_config();
        let debug = format!("{:?}", config.session_key);
        assert!(!debug.contains(&TEST_SESSION_SECRET[..8]));
    }

    #[test]
    fn test_parse_env_reports_variable() {
        // Unset variables fall back to the default, which must itself parse.
        let err = parse_env::<u16>("RATINGS_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "RATINGS_TEST_UNSET_PORT"));
        assert_eq!(parse_env::<u64>("RATINGS_TEST_UNSET_TTL", "30").unwrap(), 30);
    }

    #[test]
    fn test_socket_addr_and_https() {
        let mut config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());

        config.base_url = "https://ratings.example.com".to_string();
        assert!(config.is_https());
    }
}
