//! Ingredient model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ingredient entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Request for ingredient creation
#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    #[serde(default)]
    pub name: String,
}

/// Wire representation of an ingredient
#[derive(Debug, Serialize)]
pub struct IngredientResponse {
    pub id: Uuid,
    pub name: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
        }
    }
}
