//! HTTP routes for the API service

use axum::{
    Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::{middleware::auth_middleware, state::AppState};

pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/users/me", get(users::profile).patch(users::update_profile))
        .route("/tags", get(tags::list).post(tags::create))
        .route("/ingredients", get(ingredients::list).post(ingredients::create))
        .route("/recipes", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/:id",
            get(recipes::retrieve)
                .put(recipes::replace)
                .patch(recipes::update),
        )
        .route("/recipes/:id/image", post(recipes::upload_image))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(users::register))
        .route("/users/token", post(users::issue_token))
        .merge(protected)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let database = match common::database::health_check(&state.db_pool).await {
        Ok(true) => "up",
        _ => "down",
    };

    Json(json!({
        "status": "ok",
        "service": "recipebook-api",
        "database": database,
    }))
}
