//! JWT token generation and validation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::SecretStore;

/// Version of the claims layout. Tokens carrying any other version are rejected.
pub const CLAIMS_VERSION: u8 = 1;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived token authorizing individual requests
    Access,
    /// Long-lived token exchanged for a new pair, single use
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims shared by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Claims layout version
    pub ver: u8,
    /// Subject (account id)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Token type
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// Random nonce, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// An access token and a refresh token issued together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenPair { .. }")
    }
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs and validates tokens. Each token type has its own secret and lifetime.
#[derive(Clone)]
pub struct TokenSigner {
    access: Keys,
    refresh: Keys,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenSigner {
    pub fn new(secrets: &SecretStore) -> Self {
        Self {
            access: Keys::new(secrets.access_secret()),
            refresh: Keys::new(secrets.refresh_secret()),
            access_ttl_secs: secrets.access_ttl().as_secs(),
            refresh_ttl_secs: secrets.refresh_ttl().as_secs(),
        }
    }

    fn keys(&self, token_type: TokenType) -> (&Keys, u64) {
        match token_type {
            TokenType::Access => (&self.access, self.access_ttl_secs),
            TokenType::Refresh => (&self.refresh, self.refresh_ttl_secs),
        }
    }

    /// Sign a token of the given type for an account.
    pub fn issue(
        &self,
        token_type: TokenType,
        subject: &str,
        email: &str,
    ) -> Result<String, JwtError> {
        let (keys, duration) = self.keys(token_type);
        let now = unix_now()?;
        let jti = generate_jti();
        let exp = now.checked_add(duration).ok_or(JwtError::ExpiryOverflow)?;

        let claims = TokenClaims {
            ver: CLAIMS_VERSION,
            sub: subject.to_string(),
            email: email.to_string(),
            token_type,
            jti: jti.clone(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
            .map_err(JwtError::Encoding)?;

        debug!(token_type = token_type.as_str(), jti = %jti, exp, "Issued token");
        Ok(token)
    }

    /// Sign a fresh access/refresh pair for an account.
    pub fn issue_pair(&self, subject: &str, email: &str) -> Result<TokenPair, JwtError> {
        let access = self.issue(TokenType::Access, subject, email)?;
        let refresh = self.issue(TokenType::Refresh, subject, email)?;
        Ok(TokenPair {
            access_token: access,
            refresh_token: refresh,
        })
    }

    /// Validate and decode a token of the expected type.
    pub fn validate(&self, token_type: TokenType, token: &str) -> Result<TokenClaims, JwtError> {
        let (keys, _) = self.keys(token_type);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<TokenClaims>(token, &keys.decoding, &validation)
            .map_err(JwtError::Decoding)?;

        if token_data.claims.ver != CLAIMS_VERSION {
            return Err(JwtError::UnsupportedVersion(token_data.claims.ver));
        }

        if token_data.claims.token_type != token_type {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.validate(TokenType::Access, token)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<TokenClaims, JwtError> {
        self.validate(TokenType::Refresh, token)
    }
}

fn unix_now() -> Result<u64, JwtError> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| JwtError::TimeError)?
        .as_secs())
}

fn generate_jti() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Lifetime pushes the expiry past the representable range
    ExpiryOverflow,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
    /// Claims layout from another version
    UnsupportedVersion(u8),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::ExpiryOverflow => write!(f, "Token expiry out of range"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
            JwtError::UnsupportedVersion(v) => write!(f, "Unsupported claims version {}", v),
        }
    }
}

impl std::error::Error for JwtError {}
