use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::Json as RespJson,
    routing::post,
    Router,
};
use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use crate::error::{ApiError, StoreError};
use crate::gravatar;
use crate::model::user::{OwnerId, RegisterRequest, TokenResponse, User};
use crate::state::AppState;

pub fn users_router() -> Router {
    Router::new().route("/", post(register)) // POST /api/users
}

// Register user baru, balas dengan token
async fn register(
    Extension(state): Extension<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, RespJson<TokenResponse>), ApiError> {
    let Json(mut request) = payload?;
    // Dirapikan dulu supaya nama yang isinya spasi saja ikut ditolak
    request.name = request.name.trim().to_string();
    request.email = request.email.trim().to_lowercase();
    request.validate()?;

    let email = request.email.clone();
    info!("🔧 Register attempt for {}", email);

    if state.stores.users.find_by_email(&email).await?.is_some() {
        warn!("❌ {} is already registered", email);
        return Err(ApiError::rejected("User already exists"));
    }

    let user = User {
        id: OwnerId::new(),
        name: request.name,
        avatar: gravatar::avatar_url(&email),
        email,
        password_hash: state.credentials.hash_password(&request.password)?,
        date: Utc::now(),
    };
    let id = user.id;

    state.stores.users.insert(user).await.map_err(|e| match e {
        StoreError::Conflict(_) => ApiError::rejected("User already exists"),
        other => other.into(),
    })?;

    let token = state.credentials.issue_token(id)?;
    info!("✅ User {} registered", id);
    Ok((StatusCode::CREATED, RespJson(TokenResponse { token })))
}
