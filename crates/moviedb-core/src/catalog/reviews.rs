use bson::oid::ObjectId;
use bson::DateTime;
use moviedb_models::payload::{EditReview, NewReview, RenameReviewAuthor};
use moviedb_models::{MovieDetail, PayloadError, Review};
use tracing::{debug, info};

use super::{parse_object_id, Catalog, CatalogError};
use crate::store::UpdateCount;

fn checked_stars(stars: Option<i32>) -> Result<i32, CatalogError> {
    let stars = stars.ok_or(PayloadError::MissingField("stars"))?;
    if !Review::stars_in_range(stars) {
        return Err(PayloadError::InvalidStars(stars).into());
    }
    Ok(stars)
}

impl Catalog {
    pub async fn add_review(&self, payload: NewReview) -> Result<ObjectId, CatalogError> {
        let movie_id = parse_object_id(&payload.movie_id)?;
        let num_stars = checked_stars(payload.stars)?;
        if payload.user_id.trim().is_empty() {
            return Err(PayloadError::MissingField("user_id").into());
        }

        let review = Review {
            id: None,
            movie_id,
            user_id: payload.user_id,
            name: payload.name,
            text: payload.text,
            num_stars,
            date: DateTime::now(),
        };
        let id = self.store.insert_review(&review).await?;
        info!(review_id = %id, movie_id = %movie_id, "Added review");
        Ok(id)
    }

    /// Replace text and stars of a review. Only its author may edit it.
    pub async fn edit_review(&self, payload: EditReview) -> Result<(), CatalogError> {
        let id = parse_object_id(&payload.review_id)?;
        let stars = checked_stars(payload.stars)?;
        self.ensure_review_owner(id, &payload.user_id, "edit review").await?;

        let count = self
            .store
            .update_review(id, &payload.user_id, &payload.text, stars, DateTime::now())
            .await?;
        if count.matched == 0 {
            // Deleted or reassigned between the ownership check and the update
            return Err(CatalogError::NotOwner("edit review"));
        }
        Ok(())
    }

    pub async fn delete_review(&self, review_id: &str, user_id: &str) -> Result<(), CatalogError> {
        let id = parse_object_id(review_id)?;
        self.ensure_review_owner(id, user_id, "delete review").await?;

        if !self.store.delete_review(id, user_id).await? {
            return Err(CatalogError::NotOwner("delete review"));
        }
        info!(review_id = %id, "Deleted review");
        Ok(())
    }

    async fn ensure_review_owner(
        &self,
        id: ObjectId,
        user_id: &str,
        action: &'static str,
    ) -> Result<(), CatalogError> {
        let review = self
            .store
            .review_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound("Review Not Found".to_string()))?;
        if review.user_id != user_id {
            return Err(CatalogError::NotOwner(action));
        }
        Ok(())
    }

    pub async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>, CatalogError> {
        Ok(self.store.reviews_by_user(user_id).await?)
    }

    /// The reviewed movie (with all its reviews) for each of the user's
    /// reviews, in the same order. Movies deleted since are `None`.
    pub async fn movies_reviewed_by(&self, user_id: &str) -> Result<Vec<Option<MovieDetail>>, CatalogError> {
        let reviews = self.store.reviews_by_user(user_id).await?;
        let mut movies = Vec::with_capacity(reviews.len());
        for review in &reviews {
            movies.push(self.store.movie_with_reviews(review.movie_id).await?);
        }
        debug!(user_reviews = reviews.len(), "Loaded reviewed movies");
        Ok(movies)
    }

    pub async fn rename_review_author(&self, payload: RenameReviewAuthor) -> Result<UpdateCount, CatalogError> {
        let id = parse_object_id(&payload.review_id)?;
        Ok(self.store.rename_review_author(id, &payload.new_user_name).await?)
    }

    pub async fn rename_author_everywhere(&self, user_id: &str, name: &str) -> Result<u64, CatalogError> {
        let modified = self.store.rename_author_everywhere(user_id, name).await?;
        info!(modified, "Renamed review author");
        Ok(modified)
    }
}
