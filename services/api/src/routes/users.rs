//! Registration, token, and profile handlers

use axum::{Extension, Json, extract::State, http::StatusCode};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult, is_unique_violation},
    middleware::CurrentUser,
    models::{
        ProfileResponse, RegisterRequest, TokenRequest, TokenResponse, UpdateProfileRequest,
        UserResponse,
    },
    state::AppState,
    validation::{normalize_email, validate_email, validate_name, validate_password},
};

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let email = normalize_email(&payload.email);
    validate_email(&email).map_err(ApiError::Validation)?;
    validate_password(&payload.password).map_err(ApiError::Validation)?;

    let user = state
        .user_repository
        .create(&email, &payload.name, &payload.password)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation("A user with this email already exists".to_string())
            } else {
                error!("Failed to create user: {}", e);
                ApiError::InternalServerError
            }
        })?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Exchange credentials for an opaque bearer token
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> ApiResult<Json<TokenResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let email = normalize_email(&payload.email);

    let user = state
        .user_repository
        .find_by_email(&email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::InternalServerError
        })?
        .filter(|user| user.is_active);

    // Bad email and bad password produce the same message
    let invalid_credentials = || {
        ApiError::Validation("Unable to authenticate with provided credentials".to_string())
    };
    let user = user.ok_or_else(invalid_credentials)?;

    let verified = state
        .user_repository
        .verify_password(&user, &payload.password)
        .await
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            ApiError::InternalServerError
        })?;

    if !verified {
        return Err(invalid_credentials());
    }

    let token = state.token_repository.issue(user.id).await.map_err(|e| {
        error!("Failed to issue token: {}", e);
        ApiError::InternalServerError
    })?;

    Ok(Json(TokenResponse { token }))
}

/// Return the authenticated user's profile
pub async fn profile(Extension(user): Extension<CurrentUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        name: user.name,
        email: user.email,
    })
}

/// Apply a partial update to the authenticated user's profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let email = payload.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        validate_email(email).map_err(ApiError::Validation)?;
    }
    if let Some(password) = &payload.password {
        validate_password(password).map_err(ApiError::Validation)?;
    }
    if let Some(name) = &payload.name {
        validate_name(name).map_err(ApiError::Validation)?;
    }

    let updated = state
        .user_repository
        .update_profile(
            user.id,
            payload.name.as_deref(),
            email.as_deref(),
            payload.password.as_deref(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Validation("A user with this email already exists".to_string())
            } else {
                error!("Failed to update profile: {}", e);
                ApiError::InternalServerError
            }
        })?;

    Ok(Json(ProfileResponse::from(&updated)))
}
