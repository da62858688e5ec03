//! Ingredient repository for database operations

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::Ingredient;

/// Ingredient repository
#[derive(Clone)]
pub struct IngredientRepository {
    pool: PgPool,
}

fn row_to_ingredient(row: &PgRow) -> Ingredient {
    Ingredient {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

impl IngredientRepository {
    /// Create a new ingredient repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's ingredients ordered by name descending
    ///
    /// With `assigned_only`, restrict to ingredients referenced by at least
    /// one of the same user's recipes, de-duplicated.
    pub async fn list(&self, user_id: Uuid, assigned_only: bool) -> Result<Vec<Ingredient>> {
        let rows = if assigned_only {
            sqlx::query(
                r#"
                SELECT id, user_id, name, created_at
                FROM ingredients
                WHERE user_id = $1
                  AND EXISTS (
                      SELECT 1
                      FROM recipe_ingredients ri
                      JOIN recipes r ON r.id = ri.recipe_id
                      WHERE ri.ingredient_id = ingredients.id AND r.user_id = $1
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
                FROM ingredients
                WHERE user_id = $1
                ORDER BY name DESC
                "#,
            )
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(rows.iter().map(row_to_ingredient).collect())
    }

    /// Create a new ingredient owned by the user
    pub async fn create(&self, user_id: Uuid, name: &str) -> Result<Ingredient> {
        info!("Creating ingredient for user {}: {}", user_id, name);

        let row = sqlx::query(
            r#"
            INSERT INTO ingredients (user_id, name)
            VALUES ($1, $2)
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_ingredient(&row))
    }
}
