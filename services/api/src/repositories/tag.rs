//! Tag repository for database operations

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::Tag;

/// Tag repository
#[derive(Clone)]
pub struct TagRepository {
    pool: PgPool,
}

fn row_to_tag(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

impl TagRepository {
    /// Create a new tag repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's tags ordered by name descending
    ///
    /// With `assigned_only`, restrict to tags referenced by at least one of
    /// the same user's recipes; the EXISTS probe yields each tag once even
    /// when several recipes reference it.
    pub async fn list(&self, user_id: Uuid, assigned_only: bool) -> Result<Vec<Tag>> {
        let rows = if assigned_only {
            sqlx::query(
                r#"
                SELECT id, user_id, name, created_at
                FROM tags
                WHERE user_id = $1
                  AND EXISTS (
                      SELECT 1
                      FROM recipe_tags rt
                      JOIN recipes r ON r.id = rt.recipe_id
                      WHERE rt.tag_id = tags.id AND r.user_id = $1
                  )
                ORDER BY name DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT id, user_id, name, created_at
                FROM tags
                WHERE user_id = $1
                ORDER BY name DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.iter().map(row_to_tag).collect())
    }

    /// Create a new tag owned by the user
    pub async fn create(&self, user_id: Uuid, name: &str) -> Result<Tag> {
        info!("Creating tag for user {}: {}", user_id, name);

        let row = sqlx::query(
            r#"
            INSERT INTO tags (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_tag(&row))
    }
}
