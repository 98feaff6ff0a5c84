//! Token lifecycle: signup, signin, refresh rotation and logout.
//!
//! Every operation that hands out a token pair goes through
//! `update_refresh_token`, which stores the fingerprint of the new refresh
//! token and thereby invalidates whichever one was stored before. An account
//! therefore has at most one usable refresh token at any time.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::AuthError;
use super::types::Credentials;
use crate::db::Database;
use crate::jwt::{TokenPair, TokenSigner};
use crate::password::PasswordHasher;

/// Plaintext behind the digest that unknown emails are checked against.
const DUMMY_PASSWORD: &str = "tokenwarden-unknown-account";

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    signer: Arc<TokenSigner>,
    hasher: PasswordHasher,
    /// Hashed on first use with the configured cost
    dummy_digest: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(db: Database, signer: Arc<TokenSigner>, hasher: PasswordHasher) -> Self {
        Self {
            db,
            signer,
            hasher,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    pub fn signer(&self) -> &Arc<TokenSigner> {
        &self.signer
    }

    /// Create an account and open its first session.
    pub async fn signup(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        if credentials.password.is_empty() {
            return Err(AuthError::InvalidInput("Password cannot be empty"));
        }

        let credential_hash = self.hash(credentials.password.clone()).await?;
        let id = Uuid::new_v4().to_string();

        self.db
            .accounts()
            .create(&id, &credentials.email, &credential_hash)
            .await?;

        info!(user_id = %id, "Account created");

        self.update_refresh_token(&id, &credentials.email, None)
            .await
    }

    /// Verify email and password, then rotate in a new session.
    pub async fn signin(&self, credentials: &Credentials) -> Result<TokenPair, AuthError> {
        let Some(account) = self
            .db
            .accounts()
            .get_by_email(&credentials.email)
            .await?
        else {
            // Pay for a bcrypt verify so unknown emails take as long as wrong passwords
            let digest = self.dummy_digest().await?;
            self.compare(credentials.password.clone(), digest).await?;
            warn!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .compare(credentials.password.clone(), account.credential_hash)
            .await?;
        if !matches {
            warn!("Sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self
            .update_refresh_token(&account.id, &account.email, None)
            .await?;
        info!(user_id = %account.id, "Signed in");
        Ok(pair)
    }

    /// End the account's session. Succeeds whether or not one was active.
    pub async fn logout(&self, user_id: &str) -> Result<(), AuthError> {
        let ended = self.db.accounts().clear_refresh_fingerprint(user_id).await?;
        if ended {
            info!(user_id = %user_id, "Logged out");
        } else {
            debug!(user_id = %user_id, "Logout without active session");
        }
        Ok(())
    }

    /// Exchange the current refresh token for a new pair.
    /// The presented token stops working as soon as this succeeds.
    pub async fn refresh_tokens(
        &self,
        user_id: &str,
        presented_refresh_token: &str,
    ) -> Result<TokenPair, AuthError> {
        let Some(account) = self.db.accounts().get_by_id(user_id).await? else {
            warn!(user_id = %user_id, "Refresh rejected: unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(current) = account.refresh_fingerprint else {
            warn!(user_id = %user_id, "Refresh rejected: no active session");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .compare(presented_refresh_token.to_string(), current.clone())
            .await?;
        if !matches {
            warn!(user_id = %user_id, "Refresh rejected: token does not match session");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self
            .update_refresh_token(&account.id, &account.email, Some(&current))
            .await?;
        info!(user_id = %user_id, "Tokens refreshed");
        Ok(pair)
    }

    /// Issue a new pair and store the fingerprint of its refresh token.
    ///
    /// With `expected` set, the write only happens if the stored fingerprint
    /// is still that value; losing that race means the presented token was
    /// already spent, which is reported as `InvalidCredentials`.
    async fn update_refresh_token(
        &self,
        user_id: &str,
        email: &str,
        expected: Option<&str>,
    ) -> Result<TokenPair, AuthError> {
        let pair = self.signer.issue_pair(user_id, email)?;
        let fingerprint = self.hash(pair.refresh_token.clone()).await?;

        let accounts = self.db.accounts();
        let stored = match expected {
            Some(previous) => {
                accounts
                    .replace_refresh_fingerprint(user_id, previous, &fingerprint)
                    .await?
            }
            None => accounts.set_refresh_fingerprint(user_id, &fingerprint).await?,
        };

        if !stored {
            warn!(user_id = %user_id, "Session changed during rotation");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(pair)
    }

    async fn dummy_digest(&self) -> Result<String, AuthError> {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| self.hash(DUMMY_PASSWORD.to_string()))
            .await?;
        Ok(digest.clone())
    }

    async fn hash(&self, value: String) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let digest = tokio::task::spawn_blocking(move || hasher.hash(&value)).await??;
        Ok(digest)
    }

    async fn compare(&self, value: String, digest: String) -> Result<bool, AuthError> {
        let hasher = self.hasher;
        let matches = tokio::task::spawn_blocking(move || hasher.compare(&value, &digest)).await?;
        Ok(matches)
    }
}
