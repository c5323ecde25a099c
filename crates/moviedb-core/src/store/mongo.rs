use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, DateTime, Document};
use futures::TryStreamExt;
use moviedb_config::DatabaseConfig;
use moviedb_models::{lenient, Movie, MovieDetail, MovieRequest, RequestStatus, Review};
use mongodb::options::{AggregateOptions, ClientOptions, FindOptions, WriteConcern};
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::{debug, info};

use super::{MovieStore, RequestStore, ReviewStore, StoreError, UpdateCount};
use crate::duplicates::PlotGroup;
use crate::query::{sort_document, MovieFilters, Page};

const MOVIES: &str = "movies";
const REVIEWS: &str = "reviews";
const REQUESTS: &str = "movie_requests";

/// Store backed by the `movies`, `reviews` and `movie_requests` collections
/// of one MongoDB database.
#[derive(Clone)]
pub struct MongoStore {
    movies: Collection<Movie>,
    reviews: Collection<Review>,
    requests: Collection<MovieRequest>,
}

impl MongoStore {
    /// Connect and ping the server so a bad URI fails at startup rather
    /// than on the first request.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.uri).await?;
        options.app_name = Some("moviedb".to_string());
        options.max_pool_size = Some(config.pool_size);
        options.write_concern = Some(
            WriteConcern::builder()
                .w_timeout(Duration::from_millis(config.write_timeout_ms))
                .build(),
        );

        let client = Client::with_options(options)?;
        let database = client.database(&config.namespace);
        database.run_command(doc! { "ping": 1 }, None).await?;
        info!(namespace = %config.namespace, "Connected to MongoDB");

        Ok(Self::from_database(database))
    }

    pub fn from_database(database: Database) -> Self {
        Self {
            movies: database.collection(MOVIES),
            reviews: database.collection(REVIEWS),
            requests: database.collection(REQUESTS),
        }
    }
}

fn inserted_id(id: Bson, collection: &'static str) -> Result<ObjectId, StoreError> {
    id.as_object_id().ok_or(StoreError::MissingInsertedId(collection))
}

fn update_count(result: mongodb::results::UpdateResult) -> UpdateCount {
    UpdateCount {
        matched: result.matched_count,
        modified: result.modified_count,
    }
}

fn strings(values: Vec<Bson>) -> Vec<String> {
    let mut strings: Vec<String> = values
        .into_iter()
        .filter_map(|value| match value {
            Bson::String(s) => Some(s),
            _ => None,
        })
        .collect();
    strings.sort();
    strings
}

/// Movie document joined with its reviews, newest first.
fn movie_with_reviews_pipeline(id: ObjectId) -> Vec<Document> {
    vec![
        doc! { "$match": { "_id": id } },
        doc! {
            "$lookup": {
                "from": REVIEWS,
                "let": { "id": "$_id" },
                "pipeline": [
                    { "$match": { "$expr": { "$eq": ["$movie_id", "$$id"] } } },
                    { "$sort": { "date": -1 } },
                ],
                "as": "reviews",
            }
        },
    ]
}

fn plot_groups_pipeline() -> Vec<Document> {
    vec![doc! {
        "$group": {
            "_id": "$fullplot",
            "ids": { "$addToSet": "$_id" },
            "titles": { "$addToSet": "$title" },
            "years": { "$addToSet": "$year" },
        }
    }]
}

fn decode_plot_group(document: &Document) -> PlotGroup {
    let array = |key: &str| document.get_array(key).map(|a| a.as_slice()).unwrap_or(&[]);

    let mut years: Vec<i32> = Vec::new();
    for year in array("years").iter().filter_map(lenient::bson_to_i32) {
        if !years.contains(&year) {
            years.push(year);
        }
    }

    PlotGroup {
        fullplot: document.get_str("_id").ok().map(str::to_string),
        ids: array("ids").iter().filter_map(Bson::as_object_id).collect(),
        titles: array("titles")
            .iter()
            .filter_map(|title| title.as_str().map(str::to_string))
            .collect(),
        years,
    }
}

fn decode_movie_detail(mut document: Document) -> Result<MovieDetail, StoreError> {
    let reviews = match document.remove("reviews") {
        Some(Bson::Array(reviews)) => reviews
            .into_iter()
            .map(bson::from_bson::<Review>)
            .collect::<Result<Vec<_>, _>>()?,
        _ => Vec::new(),
    };
    let movie: Movie = bson::from_document(document)?;
    Ok(MovieDetail { movie, reviews })
}

#[async_trait]
impl MovieStore for MongoStore {
    async fn find_movies(&self, filters: &MovieFilters, page: Page) -> Result<Vec<Movie>, StoreError> {
        let options = FindOptions::builder()
            .sort(sort_document())
            .skip(page.skip())
            .limit(page.limit())
            .build();
        let cursor = self.movies.find(filters.to_document(), options).await?;
        let movies: Vec<Movie> = cursor.try_collect().await?;
        debug!(count = movies.len(), page = page.page, "Listed movies");
        Ok(movies)
    }

    async fn movie_with_reviews(&self, id: ObjectId) -> Result<Option<MovieDetail>, StoreError> {
        let mut cursor = self
            .movies
            .aggregate(movie_with_reviews_pipeline(id), None)
            .await?;
        match cursor.try_next().await? {
            Some(document) => Ok(Some(decode_movie_detail(document)?)),
            None => Ok(None),
        }
    }

    async fn distinct_genres(&self) -> Result<Vec<String>, StoreError> {
        Ok(strings(self.movies.distinct("genres", None, None).await?))
    }

    async fn distinct_rated(&self) -> Result<Vec<String>, StoreError> {
        Ok(strings(self.movies.distinct("rated", None, None).await?))
    }

    async fn plot_groups(&self) -> Result<Vec<PlotGroup>, StoreError> {
        let options = AggregateOptions::builder().allow_disk_use(true).build();
        let documents: Vec<Document> = self
            .movies
            .aggregate(plot_groups_pipeline(), options)
            .await?
            .try_collect()
            .await?;
        Ok(documents.iter().map(decode_plot_group).collect())
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<ObjectId, StoreError> {
        let result = self.movies.insert_one(movie, None).await?;
        inserted_id(result.inserted_id, MOVIES)
    }

    async fn delete_movie(&self, id: ObjectId) -> Result<bool, StoreError> {
        let result = self.movies.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count == 1)
    }
}

#[async_trait]
impl ReviewStore for MongoStore {
    async fn insert_review(&self, review: &Review) -> Result<ObjectId, StoreError> {
        let result = self.reviews.insert_one(review, None).await?;
        inserted_id(result.inserted_id, REVIEWS)
    }

    async fn review_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.find_one(doc! { "_id": id }, None).await?)
    }

    async fn update_review(
        &self,
        id: ObjectId,
        user_id: &str,
        text: &str,
        stars: i32,
        date: DateTime,
    ) -> Result<UpdateCount, StoreError> {
        let result = self
            .reviews
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "text": text, "num_stars": stars, "date": date } },
                None,
            )
            .await?;
        Ok(update_count(result))
    }

    async fn delete_review(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let result = self
            .reviews
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>, StoreError> {
        let options = FindOptions::builder().sort(doc! { "num_stars": -1 }).build();
        let cursor = self.reviews.find(doc! { "user_id": user_id }, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn rename_review_author(&self, id: ObjectId, name: &str) -> Result<UpdateCount, StoreError> {
        let result = self
            .reviews
            .update_one(doc! { "_id": id }, doc! { "$set": { "name": name } }, None)
            .await?;
        Ok(update_count(result))
    }

    async fn rename_author_everywhere(&self, user_id: &str, name: &str) -> Result<u64, StoreError> {
        let result = self
            .reviews
            .update_many(doc! { "user_id": user_id }, doc! { "$set": { "name": name } }, None)
            .await?;
        Ok(result.modified_count)
    }
}

#[async_trait]
impl RequestStore for MongoStore {
    async fn insert_request(&self, request: &MovieRequest) -> Result<ObjectId, StoreError> {
        let result = self.requests.insert_one(request, None).await?;
        inserted_id(result.inserted_id, REQUESTS)
    }

    async fn requests_by_user(&self, user_id: &str) -> Result<Vec<MovieRequest>, StoreError> {
        let cursor = self.requests.find(doc! { "user_id": user_id }, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn all_requests(&self) -> Result<Vec<MovieRequest>, StoreError> {
        let cursor = self.requests.find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let result = self
            .requests
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn decide_request(
        &self,
        id: ObjectId,
        user_id: &str,
        next: RequestStatus,
        movie_id: Option<ObjectId>,
    ) -> Result<bool, StoreError> {
        let mut changes = doc! { "status": next.as_str() };
        if let Some(movie_id) = movie_id {
            changes.insert("movie_id", movie_id);
        }
        let result = self
            .requests
            .update_one(
                doc! {
                    "_id": id,
                    "user_id": user_id,
                    "status": RequestStatus::Pending.as_str(),
                },
                doc! { "$set": changes },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }

    async fn deactivate_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let result = self
            .requests
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "active": false } },
                None,
            )
            .await?;
        Ok(result.modified_count == 1)
    }
}
