use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    response::Json as RespJson,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::model::post::{Comment, Like, Post, TextRequest};
use crate::state::AppState;

pub fn posts_router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))       // /api/posts
        .route("/:id", get(get_post).delete(delete_post))     // /api/posts/{id}
        .route("/like/:id", put(like_post))
        .route("/unlike/:id", put(unlike_post))
        .route("/comment/:id", post(add_comment))
        .route("/comment/:id/:comment_id", delete(remove_comment))
}

fn parse_post_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Post not found"))
}

async fn create_post(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<(StatusCode, RespJson<Post>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    let post = state.posts().create(owner, request.text).await?;
    Ok((StatusCode::CREATED, RespJson(post)))
}

async fn list_posts(
    Extension(state): Extension<AppState>,
    AuthUser(_): AuthUser,
) -> Result<RespJson<Vec<Post>>, ApiError> {
    Ok(RespJson(state.posts().list().await?))
}

async fn get_post(
    Extension(state): Extension<AppState>,
    AuthUser(_): AuthUser,
    Path(id): Path<String>,
) -> Result<RespJson<Post>, ApiError> {
    Ok(RespJson(state.posts().get(parse_post_id(&id)?).await?))
}

async fn delete_post(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<RespJson<Value>, ApiError> {
    state.posts().delete(owner, parse_post_id(&id)?).await?;
    Ok(RespJson(json!({ "msg": "Post removed" })))
}

async fn like_post(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<RespJson<Vec<Like>>, ApiError> {
    Ok(RespJson(state.posts().like(owner, parse_post_id(&id)?).await?))
}

async fn unlike_post(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
) -> Result<RespJson<Vec<Like>>, ApiError> {
    Ok(RespJson(state.posts().unlike(owner, parse_post_id(&id)?).await?))
}

async fn add_comment(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<TextRequest>, JsonRejection>,
) -> Result<RespJson<Vec<Comment>>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;
    let comments = state
        .posts()
        .comment(owner, parse_post_id(&id)?, request.text)
        .await?;
    Ok(RespJson(comments))
}

async fn remove_comment(
    Extension(state): Extension<AppState>,
    AuthUser(owner): AuthUser,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<RespJson<Vec<Comment>>, ApiError> {
    let comment_id =
        Uuid::parse_str(&comment_id).map_err(|_| ApiError::not_found("Comment does not exist"))?;
    let comments = state
        .posts()
        .uncomment(owner, parse_post_id(&id)?, comment_id)
        .await?;
    Ok(RespJson(comments))
}
