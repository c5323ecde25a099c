//! REST surface consumed by the frontend.

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use moviedb_config::ServerConfig;
use moviedb_core::{Accounts, Catalog};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

mod accounts;
mod error;
mod movies;
mod requests;
mod reviews;


pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub accounts: Accounts,
    /// Page size when a listing does not pass `moviesPerPage`
    pub movies_per_page: u32,
}

/// Build the application: every route nested under `api_prefix`, with a
/// JSON 404 for everything else.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let api = Router::new()
        // Movies
        .route("/", get(movies::list_movies))
        .route("/genres", get(movies::genres))
        .route("/rated", get(movies::rated))
        .route("/id/:id", get(movies::movie_by_id))
        .route("/deleteDups", delete(movies::delete_duplicates))
        .route("/addMovie", post(movies::add_movie))
        // Users
        .route("/userData", get(accounts::user_data))
        .route("/role", get(accounts::role))
        .route("/changeUserName", put(accounts::change_user_name))
        .route("/changePassword", put(accounts::change_password))
        .route("/changepfp", put(accounts::change_picture))
        .route("/account", put(accounts::delete_account))
        // Reviews
        .route("/userReviews", get(reviews::user_reviews))
        .route("/moviesReviewed", get(reviews::movies_reviewed))
        .route(
            "/reviews",
            post(reviews::add_review)
                .put(reviews::edit_review)
                .delete(reviews::delete_review),
        )
        .route("/reviewsUpdateUserName", put(reviews::rename_review_author))
        // Movie requests
        .route("/addRequest", post(requests::add_request))
        .route("/getRequests", get(requests::user_requests))
        .route("/reviewRequests", get(requests::all_requests))
        .route("/deleteRequest", delete(requests::delete_request))
        .route("/denyRequest", put(requests::deny_request))
        .route("/deactivateRequest", put(requests::deactivate_request))
        .route("/acceptRequest", put(requests::accept_request));

    let prefix = config.api_prefix.trim_end_matches('/');
    let app = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(prefix, api)
    };

    app.fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// Render documents with hex ObjectIds and RFC 3339 dates.
pub(crate) fn render<T: Serialize>(value: &T) -> Result<Value, AppError> {
    moviedb_models::to_api_json(value).map_err(|e| AppError::Internal(e.to_string()))
}

pub(crate) fn render_all<T: Serialize>(values: &[T]) -> Result<Value, AppError> {
    values
        .iter()
        .map(render)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// `"success"` or `"fail"`, the answer of the request workflow routes.
pub(crate) fn outcome(ok: bool) -> Json<&'static str> {
    Json(if ok { "success" } else { "fail" })
}
