//! Recipe repository for database operations
//!
//! Writes that touch the tag/ingredient relation sets run in a single
//! transaction so a failed attach never leaves a half-written recipe.

use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::models::{CreateRecipeRequest, Ingredient, Recipe, Tag, UpdateRecipeRequest};

/// Recipe repository
#[derive(Clone)]
pub struct RecipeRepository {
    pool: PgPool,
}

fn row_to_recipe(row: &PgRow) -> Recipe {
    Recipe {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        duration_minutes: row.get("duration_minutes"),
        price: row.get("price"),
        link: row.get("link"),
        image: row.get("image"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

async fn attach_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO recipe_tags (recipe_id, tag_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(recipe_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn attach_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    ingredient_ids: &[Uuid],
) -> Result<()> {
    if ingredient_ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO recipe_ingredients (recipe_id, ingredient_id)
        SELECT $1, unnest($2::uuid[])
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(recipe_id)
    .bind(ingredient_ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn clear_relations(tx: &mut Transaction<'_, Postgres>, recipe_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

impl RecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List a user's recipes, newest first
    ///
    /// Non-empty `tag_ids`/`ingredient_ids` restrict results to recipes
    /// whose relation sets intersect them; both filters combine with AND.
    pub async fn list(
        &self,
        user_id: Uuid,
        tag_ids: &[Uuid],
        ingredient_ids: &[Uuid],
    ) -> Result<Vec<Recipe>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, duration_minutes, price, link, image,
                   created_at, updated_at
            FROM recipes
            WHERE user_id = $1
              AND (cardinality($2::uuid[]) = 0 OR EXISTS (
                  SELECT 1 FROM recipe_tags rt
                  WHERE rt.recipe_id = recipes.id AND rt.tag_id = ANY($2)
              ))
              AND (cardinality($3::uuid[]) = 0 OR EXISTS (
                  SELECT 1 FROM recipe_ingredients ri
                  WHERE ri.recipe_id = recipes.id AND ri.ingredient_id = ANY($3)
              ))
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(tag_ids)
        .bind(ingredient_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_recipe).collect())
    }

    /// Fetch one of the user's recipes
    pub async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Recipe>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, duration_minutes, price, link, image,
                   created_at, updated_at
            FROM recipes
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_recipe))
    }

    /// Bare tag ids for a set of recipes, grouped per recipe
    pub async fn tag_ids_for(&self, recipe_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let rows = sqlx::query(
            "SELECT recipe_id, tag_id FROM recipe_tags WHERE recipe_id = ANY($1)",
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            map.entry(row.get("recipe_id"))
                .or_default()
                .push(row.get("tag_id"));
        }

        Ok(map)
    }

    /// Bare ingredient ids for a set of recipes, grouped per recipe
    pub async fn ingredient_ids_for(
        &self,
        recipe_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Uuid>>> {
        let rows = sqlx::query(
            "SELECT recipe_id, ingredient_id FROM recipe_ingredients WHERE recipe_id = ANY($1)",
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for row in rows {
            map.entry(row.get("recipe_id"))
                .or_default()
                .push(row.get("ingredient_id"));
        }

        Ok(map)
    }

    /// Tags attached to a recipe, expanded
    pub async fn tags_for(&self, recipe_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.user_id, t.name, t.created_at
            FROM tags t
            JOIN recipe_tags rt ON rt.tag_id = t.id
            WHERE rt.recipe_id = $1
            ORDER BY t.name DESC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Tag {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Ingredients attached to a recipe, expanded
    pub async fn ingredients_for(&self, recipe_id: Uuid) -> Result<Vec<Ingredient>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.user_id, i.name, i.created_at
            FROM ingredients i
            JOIN recipe_ingredients ri ON ri.ingredient_id = i.id
            WHERE ri.recipe_id = $1
            ORDER BY i.name DESC
            "#,
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Ingredient {
                id: row.get("id"),
                user_id: row.get("user_id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    /// Create a recipe and attach its relations in one transaction
    pub async fn create(&self, user_id: Uuid, payload: &CreateRecipeRequest) -> Result<Recipe> {
        info!("Creating recipe for user {}: {}", user_id, payload.title);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO recipes (user_id, title, duration_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, duration_minutes, price, link, image,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&payload.title)
        .bind(payload.duration_minutes)
        .bind(payload.price)
        .bind(payload.link.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let recipe = row_to_recipe(&row);

        attach_tags(&mut tx, recipe.id, &payload.tags).await?;
        attach_ingredients(&mut tx, recipe.id, &payload.ingredients).await?;

        tx.commit().await?;

        Ok(recipe)
    }

    /// Full replacement: scalars rewritten, relation sets rebuilt from the
    /// payload (arrays the caller omitted were defaulted to empty upstream)
    pub async fn replace(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: &CreateRecipeRequest,
    ) -> Result<Option<Recipe>> {
        info!("Replacing recipe {} for user {}", id, user_id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE recipes
            SET title = $3, duration_minutes = $4, price = $5, link = $6,
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, duration_minutes, price, link, image,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&payload.title)
        .bind(payload.duration_minutes)
        .bind(payload.price)
        .bind(payload.link.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let recipe = row_to_recipe(&row);

        clear_relations(&mut tx, id).await?;
        attach_tags(&mut tx, id, &payload.tags).await?;
        attach_ingredients(&mut tx, id, &payload.ingredients).await?;

        tx.commit().await?;

        Ok(Some(recipe))
    }

    /// Partial update: only supplied fields change; absent relation arrays
    /// leave the existing sets untouched
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        payload: &UpdateRecipeRequest,
    ) -> Result<Option<Recipe>> {
        info!("Updating recipe {} for user {}", id, user_id);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            UPDATE recipes
            SET title = COALESCE($3, title),
                duration_minutes = COALESCE($4, duration_minutes),
                price = COALESCE($5, price),
                link = COALESCE($6, link),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, duration_minutes, price, link, image,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(payload.title.as_deref())
        .bind(payload.duration_minutes)
        .bind(payload.price)
        .bind(payload.link.as_deref())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let recipe = row_to_recipe(&row);

        if let Some(tags) = &payload.tags {
            sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            attach_tags(&mut tx, id, tags).await?;
        }

        if let Some(ingredients) = &payload.ingredients {
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            attach_ingredients(&mut tx, id, ingredients).await?;
        }

        tx.commit().await?;

        Ok(Some(recipe))
    }

    /// Record the stored image path on a recipe
    pub async fn set_image(&self, id: Uuid, image: &str) -> Result<()> {
        sqlx::query("UPDATE recipes SET image = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(image)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
