use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub credential_hash: String,
    pub refresh_fingerprint: Option<String>,
}

impl Account {
    /// Whether the account currently holds a refresh fingerprint.
    pub fn has_session(&self) -> bool {
        self.refresh_fingerprint.is_some()
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    email: String,
    credential_hash: String,
    refresh_fingerprint: Option<String>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            credential_hash: row.credential_hash,
            refresh_fingerprint: row.refresh_fingerprint,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateAccountError {
    #[error("an account with this email already exists")]
    Duplicate,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account with no active session.
    pub async fn create(
        &self,
        id: &str,
        email: &str,
        credential_hash: &str,
    ) -> Result<(), CreateAccountError> {
        let result = sqlx::query("INSERT INTO accounts (id, email, credential_hash) VALUES (?, ?, ?)")
            .bind(id)
            .bind(email)
            .bind(credential_hash)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e)
                if e
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                Err(CreateAccountError::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get an account by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, credential_hash, refresh_fingerprint FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Get an account by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, email, credential_hash, refresh_fingerprint FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Account::from))
    }

    /// Overwrite the refresh fingerprint, whatever it was before.
    pub async fn set_refresh_fingerprint(
        &self,
        id: &str,
        fingerprint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE accounts SET refresh_fingerprint = ? WHERE id = ?")
            .bind(fingerprint)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Swap the refresh fingerprint only if it still equals `expected`.
    /// Returns false if another writer got there first.
    pub async fn replace_refresh_fingerprint(
        &self,
        id: &str,
        expected: &str,
        fingerprint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_fingerprint = ? WHERE id = ? AND refresh_fingerprint = ?",
        )
        .bind(fingerprint)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the refresh fingerprint if one is set. Returns true if a session ended.
    pub async fn clear_refresh_fingerprint(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE accounts SET refresh_fingerprint = NULL WHERE id = ? AND refresh_fingerprint IS NOT NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
