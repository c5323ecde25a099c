use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::DateTime;
use moviedb_models::{Movie, MovieDetail, MovieRequest, RequestStatus, Review};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;

use super::{MovieStore, RequestStore, ReviewStore, StoreError, UpdateCount};
use crate::duplicates::PlotGroup;
use crate::query::{compare_by_imdb_desc, MovieFilters, Page};

/// Store backed by in-process vectors. Used for local runs without a
/// database and by the tests.
#[derive(Default)]
pub struct InMemoryStore {
    movies: RwLock<Vec<Movie>>,
    reviews: RwLock<Vec<Review>>,
    requests: RwLock<Vec<MovieRequest>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with movies. Movies without an id get one.
    pub fn with_movies(movies: Vec<Movie>) -> Self {
        let movies = movies
            .into_iter()
            .map(|mut movie| {
                movie.id.get_or_insert_with(ObjectId::new);
                movie
            })
            .collect();
        Self {
            movies: RwLock::new(movies),
            ..Self::default()
        }
    }

    async fn reviews_for_movie(&self, movie_id: ObjectId) -> Vec<Review> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|review| review.movie_id == movie_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.date.cmp(&a.date));
        reviews
    }
}

fn distinct_sorted<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
    values.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

#[async_trait]
impl MovieStore for InMemoryStore {
    async fn find_movies(&self, filters: &MovieFilters, page: Page) -> Result<Vec<Movie>, StoreError> {
        let mut matching: Vec<Movie> = self
            .movies
            .read()
            .await
            .iter()
            .filter(|movie| filters.matches(movie))
            .cloned()
            .collect();
        matching.sort_by(compare_by_imdb_desc);

        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(skip)
            .take(page.per_page as usize)
            .collect())
    }

    async fn movie_with_reviews(&self, id: ObjectId) -> Result<Option<MovieDetail>, StoreError> {
        let movie = self
            .movies
            .read()
            .await
            .iter()
            .find(|movie| movie.id == Some(id))
            .cloned();
        let Some(movie) = movie else {
            return Ok(None);
        };
        let reviews = self.reviews_for_movie(id).await;
        Ok(Some(MovieDetail { movie, reviews }))
    }

    async fn distinct_genres(&self) -> Result<Vec<String>, StoreError> {
        let movies = self.movies.read().await;
        Ok(distinct_sorted(movies.iter().flat_map(|m| m.genres.iter().cloned())))
    }

    async fn distinct_rated(&self) -> Result<Vec<String>, StoreError> {
        let movies = self.movies.read().await;
        Ok(distinct_sorted(movies.iter().filter_map(|m| m.rated.clone())))
    }

    async fn plot_groups(&self) -> Result<Vec<PlotGroup>, StoreError> {
        let movies = self.movies.read().await;
        let mut groups: HashMap<Option<String>, PlotGroup> = HashMap::new();
        for movie in movies.iter() {
            let group = groups
                .entry(movie.fullplot.clone())
                .or_insert_with(|| PlotGroup {
                    fullplot: movie.fullplot.clone(),
                    ..PlotGroup::default()
                });
            if let Some(id) = movie.id {
                if !group.ids.contains(&id) {
                    group.ids.push(id);
                }
            }
            if !group.titles.contains(&movie.title) {
                group.titles.push(movie.title.clone());
            }
            if let Some(year) = movie.year {
                if !group.years.contains(&year) {
                    group.years.push(year);
                }
            }
        }
        Ok(groups.into_values().collect())
    }

    async fn insert_movie(&self, movie: &Movie) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        let mut movie = movie.clone();
        movie.id = Some(id);
        self.movies.write().await.push(movie);
        Ok(id)
    }

    async fn delete_movie(&self, id: ObjectId) -> Result<bool, StoreError> {
        let mut movies = self.movies.write().await;
        let before = movies.len();
        movies.retain(|movie| movie.id != Some(id));
        Ok(movies.len() < before)
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn insert_review(&self, review: &Review) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        let mut review = review.clone();
        review.id = Some(id);
        self.reviews.write().await.push(review);
        Ok(id)
    }

    async fn review_by_id(&self, id: ObjectId) -> Result<Option<Review>, StoreError> {
        let reviews = self.reviews.read().await;
        Ok(reviews.iter().find(|review| review.id == Some(id)).cloned())
    }

    async fn update_review(
        &self,
        id: ObjectId,
        user_id: &str,
        text: &str,
        stars: i32,
        date: DateTime,
    ) -> Result<UpdateCount, StoreError> {
        let mut reviews = self.reviews.write().await;
        let mut count = UpdateCount::default();
        for review in reviews
            .iter_mut()
            .filter(|review| review.id == Some(id) && review.user_id == user_id)
        {
            count.matched += 1;
            if review.text != text || review.num_stars != stars || review.date != date {
                review.text = text.to_string();
                review.num_stars = stars;
                review.date = date;
                count.modified += 1;
            }
        }
        Ok(count)
    }

    async fn delete_review(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let mut reviews = self.reviews.write().await;
        let before = reviews.len();
        reviews.retain(|review| !(review.id == Some(id) && review.user_id == user_id));
        Ok(reviews.len() < before)
    }

    async fn reviews_by_user(&self, user_id: &str) -> Result<Vec<Review>, StoreError> {
        let mut reviews: Vec<Review> = self
            .reviews
            .read()
            .await
            .iter()
            .filter(|review| review.user_id == user_id)
            .cloned()
            .collect();
        reviews.sort_by(|a, b| b.num_stars.cmp(&a.num_stars));
        Ok(reviews)
    }

    async fn rename_review_author(&self, id: ObjectId, name: &str) -> Result<UpdateCount, StoreError> {
        let mut reviews = self.reviews.write().await;
        let mut count = UpdateCount::default();
        if let Some(review) = reviews.iter_mut().find(|review| review.id == Some(id)) {
            count.matched = 1;
            if review.name != name {
                review.name = name.to_string();
                count.modified = 1;
            }
        }
        Ok(count)
    }

    async fn rename_author_everywhere(&self, user_id: &str, name: &str) -> Result<u64, StoreError> {
        let mut reviews = self.reviews.write().await;
        let mut modified = 0;
        for review in reviews
            .iter_mut()
            .filter(|review| review.user_id == user_id && review.name != name)
        {
            review.name = name.to_string();
            modified += 1;
        }
        Ok(modified)
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn insert_request(&self, request: &MovieRequest) -> Result<ObjectId, StoreError> {
        let id = ObjectId::new();
        let mut request = request.clone();
        request.id = Some(id);
        self.requests.write().await.push(request);
        Ok(id)
    }

    async fn requests_by_user(&self, user_id: &str) -> Result<Vec<MovieRequest>, StoreError> {
        let requests = self.requests.read().await;
        Ok(requests
            .iter()
            .filter(|request| request.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn all_requests(&self) -> Result<Vec<MovieRequest>, StoreError> {
        Ok(self.requests.read().await.clone())
    }

    async fn delete_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let mut requests = self.requests.write().await;
        let before = requests.len();
        requests.retain(|request| !(request.id == Some(id) && request.user_id == user_id));
        Ok(requests.len() < before)
    }

    async fn decide_request(
        &self,
        id: ObjectId,
        user_id: &str,
        next: RequestStatus,
        movie_id: Option<ObjectId>,
    ) -> Result<bool, StoreError> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests.iter_mut().find(|request| {
            request.id == Some(id) && request.user_id == user_id && request.status.can_transition_to(next)
        }) else {
            return Ok(false);
        };
        request.status = next;
        if movie_id.is_some() {
            request.movie_id = movie_id;
        }
        Ok(true)
    }

    async fn deactivate_request(&self, id: ObjectId, user_id: &str) -> Result<bool, StoreError> {
        let mut requests = self.requests.write().await;
        let Some(request) = requests
            .iter_mut()
            .find(|request| request.id == Some(id) && request.user_id == user_id && request.active)
        else {
            return Ok(false);
        };
        request.active = false;
        Ok(true)
    }
}
