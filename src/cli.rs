//! CLI argument parsing, validation, and startup helpers.

use std::time::Duration;

use crate::ServerConfig;
use crate::config::{
    ConfigError, DEFAULT_ACCESS_TTL, DEFAULT_HASH_COST, DEFAULT_REFRESH_TTL, SecretStore,
    validate_hash_cost,
};
use crate::db::Database;
use clap::Parser;
use tracing::{error, info};

const MIN_SECRET_LENGTH: usize = 32;

const ACCESS_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";
const REFRESH_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tokenwarden",
    about = "Password authentication with rotating refresh tokens"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "7292")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "tokenwarden.db")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer the ACCESS_TOKEN_SECRET env var
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer the REFRESH_TOKEN_SECRET env var
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_TTL.as_secs(), env = "ACCESS_TOKEN_TTL")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_TTL.as_secs(), env = "REFRESH_TOKEN_TTL")]
    pub refresh_ttl_secs: u64,

    /// bcrypt cost for passwords and refresh token fingerprints
    #[arg(long, default_value_t = DEFAULT_HASH_COST, env = "HASH_COST")]
    pub hash_cost: u32,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load one secret from its environment variable or, failing that, a file.
fn load_secret(
    name: &'static str,
    env_var: &str,
    file: Option<&str>,
) -> Result<String, ConfigError> {
    let secret = if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        secret
    } else if let Some(path) = file {
        std::fs::read_to_string(path)
            .map_err(|source| ConfigError::SecretFile {
                name,
                path: path.to_string(),
                source,
            })?
            .trim()
            .to_string()
    } else {
        return Err(ConfigError::MissingSecret(name));
    };

    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::SecretTooShort {
            name,
            min: MIN_SECRET_LENGTH,
        });
    }

    Ok(secret)
}

/// Load both signing secrets and the token lifetimes.
pub fn load_secrets(args: &Args) -> Result<SecretStore, ConfigError> {
    let access = load_secret(
        "access token secret",
        ACCESS_SECRET_ENV,
        args.access_secret_file.as_deref(),
    )?;
    let refresh = load_secret(
        "refresh token secret",
        REFRESH_SECRET_ENV,
        args.refresh_secret_file.as_deref(),
    )?;

    SecretStore::with_ttls(
        access,
        refresh,
        Duration::from_secs(args.access_ttl_secs),
        Duration::from_secs(args.refresh_ttl_secs),
    )
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    secrets: SecretStore,
    hash_cost: u32,
) -> Result<ServerConfig, ConfigError> {
    Ok(ServerConfig {
        db,
        secrets,
        hash_cost: validate_hash_cost(hash_cost)?,
    })
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
