//! Repositories for database operations

pub mod ingredient;
pub mod recipe;
pub mod tag;
pub mod token;
pub mod user;

pub use ingredient::IngredientRepository;
pub use recipe::RecipeRepository;
pub use tag::TagRepository;
pub use token::TokenRepository;
pub use user::UserRepository;
