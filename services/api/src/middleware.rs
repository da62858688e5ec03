//! Bearer-token authentication middleware
//!
//! Every protected route passes through here: the opaque token from the
//! Authorization header is hashed and looked up, and the resolved user is
//! injected into the request extensions.

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Authenticated user resolved from the bearer token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    if token.trim().is_empty() {
        return Err(ApiError::Unauthorized);
    }

    // Resolve the token to an active user
    let user = state
        .token_repository
        .resolve(token)
        .await
        .map_err(|e| {
            error!("Failed to resolve token: {}", e);
            ApiError::InternalServerError
        })?
        .ok_or(ApiError::Unauthorized)?;

    // Insert the user into the request extensions
    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name,
    });

    // Call the next service
    let response = next.run(req).await;

    Ok(response)
}
