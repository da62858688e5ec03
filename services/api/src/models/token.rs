//! Token issuance payloads

use serde::{Deserialize, Serialize};

/// Request for token issuance
#[derive(Debug, Default, Deserialize)]
pub struct TokenRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response carrying the raw opaque token; it is never shown again
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
