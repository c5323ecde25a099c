use bson::oid::ObjectId;
use bson::DateTime;
use moviedb_models::payload::NewMovie;
use moviedb_models::{Movie, MovieDetail};
use tracing::{info, warn};

use super::{parse_object_id, Catalog, CatalogError};
use crate::duplicates::{find_duplicates, DedupeReport};
use crate::query::{MovieFilters, Page};

impl Catalog {
    pub async fn list_movies(&self, filters: &MovieFilters, page: Page) -> Result<Vec<Movie>, CatalogError> {
        Ok(self.store.find_movies(filters, page).await?)
    }

    pub async fn movie_by_id(&self, id: &str) -> Result<MovieDetail, CatalogError> {
        let id = parse_object_id(id)?;
        self.store
            .movie_with_reviews(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound("Movie Not Found".to_string()))
    }

    pub async fn genres(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.store.distinct_genres().await?)
    }

    pub async fn ratings(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.store.distinct_rated().await?)
    }

    pub async fn add_movie(&self, payload: NewMovie) -> Result<ObjectId, CatalogError> {
        let movie = payload.into_movie(DateTime::now())?;
        let id = self.store.insert_movie(&movie).await?;
        info!(movie_id = %id, title = %movie.title, "Added movie");
        Ok(id)
    }

    /// Delete every extra copy of duplicated movies, keeping the oldest.
    pub async fn delete_duplicates(&self) -> Result<DedupeReport, CatalogError> {
        let groups = self.store.plot_groups().await?;
        let sets = find_duplicates(groups);
        if sets.is_empty() {
            info!("No duplicate movies found");
            return Ok(DedupeReport::default());
        }

        let mut report = DedupeReport {
            sets,
            ..DedupeReport::default()
        };
        for set in &report.sets {
            for id in &set.extra {
                if self.store.delete_movie(*id).await? {
                    report.deleted += 1;
                } else {
                    warn!(movie_id = %id, title = %set.title, "Duplicate copy was not deleted");
                    report.failed.push(*id);
                }
            }
        }

        info!(
            "Deleted {} duplicate copies across {} movies ({} failed)",
            report.deleted,
            report.sets.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
