use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    response::Json as RespJson,
    routing::{delete, get, put},
    Router,
};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::model::profile::{NewEducation, NewExperience, Profile, ProfileFields};
use crate::model::user::OwnerId;
use crate::service::profile::UpsertOutcome;
use crate::state::AppState;

pub fn profile_router() -> Router {
    Router::new()
        .route("/", get(list_profiles).post(upsert_profile).delete(delete_account)) // /api/profile
        .route("/me", get(get_my_profile))                      // GET /api/profile/me
        .route("/user/:user_id", get(get_profile_by_user))      // GET /api/profile/user/{user_id}
        .route("/experience", put(add_experience))              // PUT /api/profile/experience
        .route("/experience/:exp_id", delete(remove_experience))
        .route("/education", put(add_education))                // PUT /api/profile/education
        .route("/education/:edu_id", delete(remove_education))
        .route("/github/:username", get(github_repos))          // GET /api/profile/github/{username}
}

// Entry id yang bukan UUID tidak mungkin ada di profil
fn parse_entry_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(format!("{} not found", what)))
}

async fn get_my_profile(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<RespJson<Value>, ApiError> {
    let service = state.profiles();
    let profile = service.get_by_owner(owner).await?;
    let mut populated = service.populate(vec![profile]).await?;
    Ok(RespJson(populated.pop().unwrap_or(Value::Null)))
}

async fn upsert_profile(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<ProfileFields>, JsonRejection>,
) -> Result<(StatusCode, RespJson<Profile>), ApiError> {
    let Json(fields) = payload?;
    fields.validate()?;

    let upserted = state.profiles().upsert_profile(owner, fields).await?;
    let status = match upserted.outcome {
        UpsertOutcome::Created => StatusCode::CREATED,
        UpsertOutcome::Updated => StatusCode::OK,
    };
    Ok((status, RespJson(upserted.profile)))
}

async fn list_profiles(Extension(state): Extension<AppState>) -> Result<RespJson<Vec<Value>>, ApiError> {
    let service = state.profiles();
    let profiles = service.list_all().await?;
    info!("✅ Found {} profiles", profiles.len());
    Ok(RespJson(service.populate(profiles).await?))
}

async fn get_profile_by_user(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<String>,
) -> Result<RespJson<Value>, ApiError> {
    let owner: OwnerId = user_id.parse().map_err(|e| {
        warn!("❌ Invalid user id {}: {}", user_id, e);
        ApiError::BadRequest("Profile not found".into())
    })?;

    let service = state.profiles();
    let profile = service.get_by_owner(owner).await?;
    let mut populated = service.populate(vec![profile]).await?;
    Ok(RespJson(populated.pop().unwrap_or(Value::Null)))
}

async fn delete_account(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
) -> Result<RespJson<Value>, ApiError> {
    state.profiles().delete_account(owner).await?;
    Ok(RespJson(json!({ "msg": "User deleted" })))
}

async fn add_experience(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<NewExperience>, JsonRejection>,
) -> Result<RespJson<Profile>, ApiError> {
    let Json(entry) = payload?;
    entry.validate()?;
    Ok(RespJson(state.profiles().add_experience(owner, entry).await?))
}

async fn remove_experience(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(exp_id): Path<String>,
) -> Result<RespJson<Profile>, ApiError> {
    let entry_id = parse_entry_id(&exp_id, "Experience")?;
    Ok(RespJson(state.profiles().remove_experience(owner, entry_id).await?))
}

async fn add_education(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<NewEducation>, JsonRejection>,
) -> Result<RespJson<Profile>, ApiError> {
    let Json(entry) = payload?;
    entry.validate()?;
    Ok(RespJson(state.profiles().add_education(owner, entry).await?))
}

async fn remove_education(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(edu_id): Path<String>,
) -> Result<RespJson<Profile>, ApiError> {
    let entry_id = parse_entry_id(&edu_id, "Education")?;
    Ok(RespJson(state.profiles().remove_education(owner, entry_id).await?))
}

async fn github_repos(
    Extension(state): Extension<AppState>,
    Path(username): Path<String>,
) -> Result<RespJson<Value>, ApiError> {
    Ok(RespJson(state.github.latest_repos(&username).await?))
}
