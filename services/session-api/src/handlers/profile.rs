//! Handlers behind the auth layer

use axum::Json;
use serde::Serialize;
use tessera_axum::RequireAuth;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user_key: String,
    pub token_source: &'static str,
}

/// GET /api/me
pub async fn me(auth: RequireAuth) -> Json<MeResponse> {
    Json(MeResponse {
        user_key: auth.user_key.clone(),
        token_source: auth.source.as_str(),
    })
}
