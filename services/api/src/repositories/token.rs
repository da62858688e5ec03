//! Opaque bearer-token repository
//!
//! Raw tokens are handed to clients once; only their SHA-256 digest is
//! stored, so token rows at rest are not usable credentials.

use anyhow::Result;
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::user::row_to_user;
use crate::models::User;

/// Length of issued bearer tokens
const TOKEN_LENGTH: usize = 40;

/// Token repository
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

fn generate_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl TokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a new token for a user, returning the raw token exactly once
    pub async fn issue(&self, user_id: Uuid) -> Result<String> {
        info!("Issuing token for user: {}", user_id);

        let token = generate_token();

        sqlx::query("INSERT INTO auth_tokens (user_id, token_hash) VALUES ($1, $2)")
            .bind(user_id)
            .bind(token_digest(&token))
            .execute(&self.pool)
            .await?;

        Ok(token)
    }

    /// Resolve a raw token to its active owner
    pub async fn resolve(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff,
                   u.is_superuser, u.created_at, u.updated_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = $1 AND u.is_active
            "#,
        )
        .bind(token_digest(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_user))
    }
}
