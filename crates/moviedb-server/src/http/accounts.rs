use super::{AppError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use moviedb_models::payload::{ChangePassword, ChangePicture, ChangeUserName, DeleteAccount};
use moviedb_models::ProviderUser;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    email: String,
}

/// Provider records are passed through unchanged.
pub async fn user_data(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<ProviderUser>>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.accounts.user_data(&query.email).await?))
}

pub async fn role(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<bool>, AppError> {
    let Query(query) = query?;
    Ok(Json(state.accounts.is_admin(&query.email).await?))
}

pub async fn change_user_name(
    State(state): State<AppState>,
    payload: Result<Json<ChangeUserName>, JsonRejection>,
) -> Result<Json<bool>, AppError> {
    let Json(change) = payload?;
    Ok(Json(state.accounts.change_user_name(change).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePassword>, JsonRejection>,
) -> Result<Json<bool>, AppError> {
    let Json(change) = payload?;
    Ok(Json(state.accounts.request_password_reset(change).await?))
}

pub async fn change_picture(
    State(state): State<AppState>,
    payload: Result<Json<ChangePicture>, JsonRejection>,
) -> Result<Json<bool>, AppError> {
    let Json(change) = payload?;
    Ok(Json(state.accounts.change_picture(change).await?))
}

pub async fn delete_account(
    State(state): State<AppState>,
    payload: Result<Json<DeleteAccount>, JsonRejection>,
) -> Result<Json<bool>, AppError> {
    let Json(request) = payload?;
    let user_id = request.user_id.clone();
    let deleted = state.accounts.delete_account(request).await?;
    info!(
        operation = "delete_account",
        user_id = %user_id,
        provider = state.accounts.provider_name(),
        deleted,
        "Account deletion forwarded"
    );
    Ok(Json(deleted))
}
