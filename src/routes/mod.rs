use axum::{extract::Extension, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::state::AppState;

pub mod auth;
pub mod posts;
pub mod profile;
pub mod users;

use auth::auth_router;
use posts::posts_router;
use profile::profile_router;
use users::users_router;

/// The full application. With `static_dir` set, unknown paths fall through to
/// the built client and finally to its `index.html`.
pub fn app(state: AppState, static_dir: Option<&str>) -> Router {
    let mut router = Router::new()
        .nest("/api/users", users_router())
        .nest("/api/auth", auth_router())
        .nest("/api/profile", profile_router())
        .nest("/api/posts", posts_router())
        .route("/api/health", get(|| async { "ok" }));

    if let Some(dir) = static_dir {
        let serve_dir =
            ServeDir::new(dir).not_found_service(ServeFile::new(format!("{}/index.html", dir)));
        router = router.fallback_service(serve_dir);
    }

    router
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}
