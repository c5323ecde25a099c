use super::{render, render_all, AppError, AppState};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use moviedb_core::{MovieFilters, Page, NO_DUPLICATES};
use moviedb_models::lenient::parse_int_prefix;
use moviedb_models::payload::NewMovie;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Listing query. Everything arrives as text and is parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    title: Option<String>,
    genres: Option<String>,
    rated: Option<String>,
    year: Option<String>,
    page: Option<String>,
    #[serde(rename = "moviesPerPage")]
    movies_per_page: Option<String>,
}

impl ListQuery {
    fn filters(&self) -> Result<MovieFilters, AppError> {
        let year = match non_empty(&self.year) {
            Some(raw) => {
                let year = parse_int_prefix(raw)
                    .and_then(|y| i32::try_from(y).ok())
                    .ok_or_else(|| AppError::MalformedPayload(format!("Invalid year: {}", raw)))?;
                Some(year)
            }
            None => None,
        };

        Ok(MovieFilters {
            title: non_empty(&self.title).map(str::to_string),
            genre: non_empty(&self.genres).map(str::to_string),
            rated: non_empty(&self.rated).map(str::to_string),
            year,
        })
    }

    fn page(&self, default_per_page: u32) -> Page {
        let page = count(&self.page).unwrap_or(0);
        let per_page = count(&self.movies_per_page)
            .filter(|n| *n > 0)
            .unwrap_or(default_per_page);
        Page::new(page, per_page)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn count(value: &Option<String>) -> Option<u32> {
    non_empty(value)
        .and_then(parse_int_prefix)
        .and_then(|n| u32::try_from(n).ok())
}

pub async fn list_movies(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let Query(query) = query?;
    let filters = query.filters()?;
    let page = query.page(state.movies_per_page);
    debug!(operation = "list_movies", ?filters, page = page.page, per_page = page.per_page, "Listing movies");

    let movies = state.catalog.list_movies(&filters, page).await?;
    Ok(Json(json!({
        "moviesList": render_all(&movies)?,
        "page": page.page,
        "entries_per_page": page.per_page,
    })))
}

pub async fn genres(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.catalog.genres().await?))
}

pub async fn rated(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.catalog.ratings().await?))
}

pub async fn movie_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let detail = state.catalog.movie_by_id(&id).await?;
    let body = detail
        .to_api_json()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(body))
}

pub async fn delete_duplicates(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let report = state.catalog.delete_duplicates().await?;
    if report.nothing_to_delete() {
        return Ok(Json(json!(NO_DUPLICATES)));
    }

    info!(
        operation = "delete_duplicates",
        sets = report.sets.len(),
        deleted = report.deleted,
        failed = report.failed.len(),
        "Removed duplicate movies"
    );
    Ok(Json(json!(report.all_deleted())))
}

pub async fn add_movie(
    State(state): State<AppState>,
    payload: Result<Json<NewMovie>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(payload) = payload?;
    let title = payload.title.clone();
    let id = state.catalog.add_movie(payload).await?;
    info!(operation = "add_movie", id = %id, title = %title, "Movie added");
    Ok(Json(json!({ "status": "success", "id": render(&id)? })))
}
