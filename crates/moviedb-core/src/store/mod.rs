use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::DateTime;
use moviedb_models::{Movie, MovieDetail, MovieRequest, RequestStatus, Review};
use serde::Serialize;
use thiserror::Error;

use crate::duplicates::PlotGroup;
use crate::query::{MovieFilters, Page};

pub mod memory;
pub mod mongo;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Failed to decode document: {0}")]
    Decode(#[from] bson::de::Error),

    #[error("Failed to encode document: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("Insert into {0} did not return an ObjectId")]
    MissingInsertedId(&'static str),
}

/// Result of an update, in the shape the frontend reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UpdateCount {
    #[serde(rename = "matchedCount")]
    pub matched: u64,
    #[serde(rename = "modifiedCount")]
    pub modified: u64,
}

#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn find_movies(&self, filters: &MovieFilters, page: Page) -> Result<Vec<Movie>, StoreError>;

    /// The movie with its reviews, newest review first.
    async fn movie_with_reviews(&self, id: ObjectId) -> Result<Option<MovieDetail>, StoreError>;

    async fn distinct_genres(&self) -> Result<Vec<String>, StoreError>;

    async fn distinct_rated(&self) -> Result<Vec<String>, StoreError>;

    /// Movies grouped by identical `fullplot`.
    async fn plot_groups(&self) -> Result<Vec<PlotGroup>, StoreError>;

    async fn insert_movie(&self, movie: &Movie) -> Result<ObjectId, StoreError>;

    /// Returns whether a movie was deleted.
    async fn delete_movie(&self, id: ObjectId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: &Review) -> Result<ObjectId, StoreError>;

    async fn review_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError>;

    /// Update text, stars and date of a review owned by `user_id`.
    async fn update_review(
        &self,
        id: ObjectId,
        user_id: &str,
        text: &str,
        stars: i32,
        date: DateTime,
    ) -> Result<UpdateCount, StoreError>;

    async fn delete_review(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError>;

    /// Reviews written by `user_id`, highest star count first.
    async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>, StoreError>;

    async fn rename_review_author(&self, id: ObjectId, name: &str) -> Result<UpdateCount, StoreError>;

    /// Rewrite the author name on every review of `user_id`. Returns the
    /// number of reviews changed.
    async fn rename_author_everywhere(&self, user_id: &str, name: &str) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert_request(&self, request: &MovieRequest) -> Result<ObjectId, StoreError>;

    async fn requests_by_user(&self, user_id: &str) -> Result<Vec<MovieRequest>, StoreError>;

    async fn all_requests(&self) -> Result<Vec<MovieRequest>, StoreError>;

    async fn delete_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError>;

    /// Move a pending request of `user_id` to `next`, recording the movie
    /// it produced. Returns false when no pending request matched.
    async fn decide_request(
        &self,
        id: ObjectId,
        user_id: &str,
        next: RequestStatus,
        movie_id: Option<ObjectId>,
    ) -> Result<bool, StoreError>;

    /// Clear `active` without touching the status. Returns false when the
    /// request was not found or already inactive.
    async fn deactivate_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError>;
}

/// Everything the catalog needs from a backend.
pub trait Store: MovieStore + ReviewStore + RequestStore {}

impl<T> Store for T where T: MovieStore + ReviewStore + RequestStore {}
