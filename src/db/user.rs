//! Credential records: password hash plus the single current refresh token.

use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    pub refresh_token: String,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the record for a username. `None` means not found.
    pub async fn get(&self, username: &str) -> Result<Option<CredentialRecord>, sqlx::Error> {
        sqlx::query_as(
            "SELECT username, password_hash, refresh_token FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
    }

    /// Insert a new record. Fails with a unique violation if the username is taken.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        refresh_token: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO users (username, password_hash, refresh_token) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(refresh_token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Replace the stored refresh token unconditionally.
    /// Returns false if no record exists.
    pub async fn update_refresh_token(
        &self,
        username: &str,
        refresh_token: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, updated_at = datetime('now') WHERE username = ?",
        )
        .bind(refresh_token)
        .bind(username)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the stored refresh token only if it still equals `expected`.
    ///
    /// Single statement, so two requests presenting the same token cannot both
    /// win. Returns false if the token was already rotated.
    pub async fn rotate_refresh_token(
        &self,
        username: &str,
        expected: &str,
        refresh_token: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = ?, updated_at = datetime('now') WHERE username = ? AND refresh_token = ?",
        )
        .bind(refresh_token)
        .bind(username)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Whether an error is a unique-key violation (username already taken).
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}
