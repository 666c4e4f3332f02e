use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    response::Json as RespJson,
    routing::get,
    Router,
};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::model::user::{LoginRequest, TokenResponse, User};
use crate::state::AppState;

pub fn auth_router() -> Router {
    Router::new().route("/", get(current_user).post(login)) // GET, POST /api/auth
}

// Data user yang sedang login (tanpa password)
async fn current_user(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<RespJson<User>, ApiError> {
    let user = state
        .stores
        .users
        .get(owner)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(RespJson(user))
}

async fn login(
    Extension(state): Extension<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<RespJson<TokenResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let email = request.email.trim().to_lowercase();
    info!("🔧 Login attempt for {}", email);

    let user = match state.stores.users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!("❌ Unknown e-mail {}", email);
            return Err(ApiError::rejected("Invalid credentials"));
        }
    };

    if !state
        .credentials
        .verify_password(&request.password, &user.password_hash)?
    {
        warn!("❌ Wrong password for {}", user.id);
        return Err(ApiError::rejected("Invalid credentials"));
    }

    let token = state.credentials.issue_token(user.id)?;
    info!("✅ Login successful for {}", user.id);
    Ok(RespJson(TokenResponse { token }))
}
