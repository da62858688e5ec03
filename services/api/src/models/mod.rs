//! API models for entities, requests, and responses

use serde::Deserialize;

pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod token;
pub mod user;

pub use ingredient::{CreateIngredientRequest, Ingredient, IngredientResponse};
pub use recipe::{
    CreateRecipeRequest, Recipe, RecipeDetail, RecipeListQuery, RecipeSummary, UpdateRecipeRequest,
};
pub use tag::{CreateTagRequest, Tag, TagResponse};
pub use token::{TokenRequest, TokenResponse};
pub use user::{ProfileResponse, RegisterRequest, UpdateProfileRequest, User, UserResponse};

/// Query parameters for tag and ingredient listings
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub assigned_only: Option<String>,
}

impl CatalogQuery {
    /// Truthy values are `1` and `true`
    pub fn assigned_only(&self) -> bool {
        matches!(self.assigned_only.as_deref(), Some("1") | Some("true"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_only_truthiness() {
        let truthy = CatalogQuery {
            assigned_only: Some("1".to_string()),
        };
        assert!(truthy.assigned_only());

        let also_truthy = CatalogQuery {
            assigned_only: Some("true".to_string()),
        };
        assert!(also_truthy.assigned_only());

        let falsy = CatalogQuery {
            assigned_only: Some("0".to_string()),
        };
        assert!(!falsy.assigned_only());

        assert!(!CatalogQuery::default().assigned_only());
    }
}
