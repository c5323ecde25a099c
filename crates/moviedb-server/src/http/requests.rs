use super::{outcome, render_all, AppError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use moviedb_models::payload::{AcceptRequest, NewMovieRequest, RequestAction, Requester};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    email: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestQuery {
    id: String,
}

pub async fn add_request(
    State(state): State<AppState>,
    payload: Result<Json<NewMovieRequest>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(payload) = payload?;
    let id = state.catalog.submit_request(payload).await?;
    info!(operation = "add_request", id = %id, "Movie request submitted");
    Ok(outcome(true))
}

pub async fn user_requests(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let requests = state.catalog.requests_by_user(&query.email).await?;
    Ok(Json(json!({ "requestList": render_all(&requests)? })))
}

pub async fn all_requests(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let requests = state.catalog.all_requests().await?;
    Ok(Json(json!({ "requestList": render_all(&requests)? })))
}

pub async fn delete_request(
    State(state): State<AppState>,
    query: Result<Query<RequestQuery>, QueryRejection>,
    payload: Result<Json<Requester>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Query(query) = query?;
    let Json(requester) = payload?;
    let deleted = state
        .catalog
        .delete_request(&query.id, &requester.user_id)
        .await?;
    if !deleted {
        warn!(operation = "delete_request", id = %query.id, "No request deleted");
    }
    Ok(outcome(deleted))
}

pub async fn deny_request(
    State(state): State<AppState>,
    payload: Result<Json<RequestAction>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(action) = payload?;
    let id = action.id.clone();
    let denied = state.catalog.deny_request(action).await?;
    info!(operation = "deny_request", id = %id, denied, "Request reviewed");
    Ok(outcome(denied))
}

pub async fn deactivate_request(
    State(state): State<AppState>,
    payload: Result<Json<RequestAction>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(action) = payload?;
    let id = action.id.clone();
    let deactivated = state.catalog.deactivate_request(action).await?;
    info!(operation = "deactivate_request", id = %id, deactivated, "Request hidden");
    Ok(outcome(deactivated))
}

pub async fn accept_request(
    State(state): State<AppState>,
    payload: Result<Json<AcceptRequest>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(payload) = payload?;
    let id = payload.id.clone();
    let accepted = state.catalog.accept_request(payload).await?;
    info!(operation = "accept_request", id = %id, accepted, "Request reviewed");
    Ok(outcome(accepted))
}
