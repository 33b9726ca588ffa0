use serde::{Deserialize, Serialize};

/// Request body for POST /signups.
#[derive(Debug, Deserialize)]
pub struct CreateSignupRequest {
    pub email: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}
