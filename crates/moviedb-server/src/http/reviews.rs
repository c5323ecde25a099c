use super::{render, render_all, AppError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use moviedb_models::payload::{EditReview, NewReview, RenameReviewAuthor, Requester};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewQuery {
    id: String,
}

pub async fn add_review(
    State(state): State<AppState>,
    payload: Result<Json<NewReview>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let movie_id = payload.movie_id.clone();
    let id = state.catalog.add_review(payload).await?;
    info!(operation = "add_review", id = %id, movie_id = %movie_id, "Review added");
    Ok(Json(json!({ "status": "success", "id": render(&id)? })))
}

pub async fn edit_review(
    State(state): State<AppState>,
    payload: Result<Json<EditReview>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let review_id = payload.review_id.clone();
    state.catalog.edit_review(payload).await?;
    info!(operation = "edit_review", id = %review_id, "Review updated");
    Ok(Json(json!({ "status": "success" })))
}

pub async fn delete_review(
    State(state): State<AppState>,
    query: Result<Query<ReviewQuery>, QueryRejection>,
    payload: Result<Json<Requester>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let Json(requester) = payload?;
    state.catalog.delete_review(&query.id, &requester.user_id).await?;
    info!(operation = "delete_review", id = %query.id, "Review deleted");
    Ok(Json(json!({ "status": "success" })))
}

pub async fn user_reviews(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let reviews = state.catalog.reviews_by_user(&query.user_id).await?;
    Ok(Json(render_all(&reviews)?))
}

/// Movies the user reviewed, in review order. Reviews of deleted movies
/// show up as `null`.
pub async fn movies_reviewed(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let movies = state.catalog.movies_reviewed_by(&query.user_id).await?;
    let rendered = movies
        .iter()
        .map(|movie| match movie {
            Some(detail) => detail
                .to_api_json()
                .map_err(|e| AppError::Internal(e.to_string())),
            None => Ok(Value::Null),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(Value::Array(rendered)))
}

pub async fn rename_review_author(
    State(state): State<AppState>,
    payload: Result<Json<RenameReviewAuthor>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let count = state.catalog.rename_review_author(payload).await?;
    Ok(Json(render(&count)?))
}
