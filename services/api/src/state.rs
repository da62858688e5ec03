//! Application state shared across handlers

use sqlx::PgPool;
use std::path::PathBuf;

use crate::{
    repositories::{
        IngredientRepository, RecipeRepository, TagRepository, TokenRepository, UserRepository,
    },
    storage::ImageStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub user_repository: UserRepository,
    pub token_repository: TokenRepository,
    pub tag_repository: TagRepository,
    pub ingredient_repository: IngredientRepository,
    pub recipe_repository: RecipeRepository,
    pub image_store: ImageStore,
}

impl AppState {
    /// Wire repositories and image storage from a pool and media root
    pub fn new(pool: PgPool, media_root: impl Into<PathBuf>) -> Self {
        Self {
            user_repository: UserRepository::new(pool.clone()),
            token_repository: TokenRepository::new(pool.clone()),
            tag_repository: TagRepository::new(pool.clone()),
            ingredient_repository: IngredientRepository::new(pool.clone()),
            recipe_repository: RecipeRepository::new(pool.clone()),
            image_store: ImageStore::new(media_root),
            db_pool: pool,
        }
    }
}
