use bson::oid::ObjectId;
use bson::DateTime;
use moviedb_models::payload::{AcceptRequest, NewMovieRequest, RequestAction};
use moviedb_models::{MovieRequest, RequestStatus};
use tracing::{info, warn};

use super::{parse_object_id, Catalog, CatalogError};
use crate::query::{MovieFilters, Page, DEFAULT_PER_PAGE};

impl Catalog {
    pub async fn submit_request(&self, payload: NewMovieRequest) -> Result<ObjectId, CatalogError> {
        let request = payload.into_request(DateTime::now())?;
        let id = self.store.insert_request(&request).await?;
        info!(request_id = %id, title = %request.title, "Movie request submitted");
        Ok(id)
    }

    pub async fn requests_by_user(&self, user_id: &str) -> Result<Vec<MovieRequest>, CatalogError> {
        Ok(self.store.requests_by_user(user_id).await?)
    }

    pub async fn all_requests(&self) -> Result<Vec<MovieRequest>, CatalogError> {
        Ok(self.store.all_requests().await?)
    }

    /// Returns false unless a request with this id belongs to `user_id`.
    pub async fn delete_request(&self, id: &str, user_id: &str) -> Result<bool, CatalogError> {
        let id = parse_object_id(id)?;
        Ok(self.store.delete_request(id, user_id).await?)
    }

    /// pending -> denied. `active` is left as it is.
    pub async fn deny_request(&self, action: RequestAction) -> Result<bool, CatalogError> {
        let id = parse_object_id(&action.id)?;
        let denied = self
            .store
            .decide_request(id, &action.user_id, RequestStatus::Denied, None)
            .await?;
        if !denied {
            warn!(request_id = %id, "No pending request to deny");
        }
        Ok(denied)
    }

    /// Hide a request from its author's profile. The status is untouched.
    pub async fn deactivate_request(&self, action: RequestAction) -> Result<bool, CatalogError> {
        let id = parse_object_id(&action.id)?;
        Ok(self.store.deactivate_request(id, &action.user_id).await?)
    }

    /// pending -> accepted, linking the movie an admin added for the
    /// request. The movie is looked up by title, year, rating and first
    /// genre.
    pub async fn accept_request(&self, payload: AcceptRequest) -> Result<bool, CatalogError> {
        let id = parse_object_id(&payload.id)?;
        let filters = MovieFilters {
            title: Some(payload.title.clone()),
            genre: payload.genres.first().cloned(),
            rated: payload.rated.clone(),
            year: payload.year,
        };
        let movie_id = self
            .store
            .find_movies(&filters, Page::new(0, DEFAULT_PER_PAGE))
            .await?
            .into_iter()
            .find_map(|movie| movie.id)
            .ok_or_else(|| CatalogError::NotFound(format!("No movie matches request '{}'", payload.title)))?;

        let accepted = self
            .store
            .decide_request(id, &payload.user_id, RequestStatus::Accepted, Some(movie_id))
            .await?;
        if accepted {
            info!(request_id = %id, movie_id = %movie_id, "Movie request accepted");
        } else {
            warn!(request_id = %id, "No pending request to accept");
        }
        Ok(accepted)
    }
}
