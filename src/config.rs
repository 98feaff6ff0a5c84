//! Signing secrets and token lifetimes, fixed at startup.
//!
//! A `SecretStore` is built once (see `cli::load_secrets`) and handed to the
//! token signer by value. Nothing in the request path reads the environment.

use std::fmt;
use std::time::Duration;

/// Access token lifetime: 15 minutes
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Refresh token lifetime: 7 days
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest lifetime accepted for either token kind: 1 year
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// bcrypt cost used for passwords and refresh fingerprints.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Cost bounds accepted by bcrypt.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    MissingSecret(&'static str),
    #[error("failed to read {name} from {path}: {source}")]
    SecretFile {
        name: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[error("{name} is shorter than {min} characters")]
    SecretTooShort { name: &'static str, min: usize },
    #[error("access and refresh secrets must differ")]
    SharedSecret,
    #[error("{0} must be greater than zero")]
    ZeroTtl(&'static str),
    #[error("{name} must not exceed {max} seconds")]
    TtlTooLong { name: &'static str, max: u64 },
    #[error("hash cost must be between {min} and {max}, got {got}")]
    HashCost { min: u32, max: u32, got: u32 },
}

/// Two signing secrets and their lifetimes.
#[derive(Clone)]
pub struct SecretStore {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SecretStore {
    /// Build a store with the default lifetimes.
    pub fn new(
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        Self::with_ttls(
            access_secret,
            refresh_secret,
            DEFAULT_ACCESS_TTL,
            DEFAULT_REFRESH_TTL,
        )
    }

    pub fn with_ttls(
        access_secret: impl Into<Vec<u8>>,
        refresh_secret: impl Into<Vec<u8>>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();

        if access_secret.is_empty() {
            return Err(ConfigError::MissingSecret("access token secret"));
        }
        if refresh_secret.is_empty() {
            return Err(ConfigError::MissingSecret("refresh token secret"));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::SharedSecret);
        }
        if access_ttl.as_secs() == 0 {
            return Err(ConfigError::ZeroTtl("access token lifetime"));
        }
        if refresh_ttl.as_secs() == 0 {
            return Err(ConfigError::ZeroTtl("refresh token lifetime"));
        }
        for (name, ttl) in [
            ("access token lifetime", access_ttl),
            ("refresh token lifetime", refresh_ttl),
        ] {
            if ttl > MAX_TTL {
                return Err(ConfigError::TtlTooLong {
                    name,
                    max: MAX_TTL.as_secs(),
                });
            }
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl,
            refresh_ttl,
        })
    }

    pub fn access_secret(&self) -> &[u8] {
        &self.access_secret
    }

    pub fn refresh_secret(&self) -> &[u8] {
        &self.refresh_secret
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

// Secrets stay out of logs and panic messages.
impl fmt::Debug for SecretStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretStore")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

/// Check a bcrypt cost against the range the hasher accepts.
pub fn validate_hash_cost(cost: u32) -> Result<u32, ConfigError> {
    if (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
        Ok(cost)
    } else {
        Err(ConfigError::HashCost {
            min: MIN_HASH_COST,
            max: MAX_HASH_COST,
            got: cost,
        })
    }
}
