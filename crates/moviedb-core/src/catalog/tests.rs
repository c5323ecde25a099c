use super::*;
use crate::query::{MovieFilters, Page};
use crate::store::{InMemoryStore, MovieStore, RequestStore};
use bson::oid::ObjectId;
use moviedb_models::payload::{
    AcceptRequest, EditReview, NewMovie, NewMovieRequest, NewReview, RenameReviewAuthor, RequestAction,
};
use moviedb_models::{Imdb, Movie, PayloadError, RequestStatus};

fn movie(title: &str, year: i32, plot: &str, rating: f64) -> Movie {
    Movie {
        title: title.to_string(),
        year: Some(year),
        fullplot: Some(plot.to_string()),
        genres: vec!["Drama".to_string()],
        rated: Some("PG".to_string()),
        imdb: Some(Imdb {
            rating: Some(rating),
            votes: Some(100),
            id: None,
        }),
        ..Movie::default()
    }
}

fn catalog_with(movies: Vec<Movie>) -> (Catalog, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::with_movies(movies));
    (Catalog::new(store.clone()), store)
}

fn new_review(movie_id: ObjectId, user_id: &str, stars: i32) -> NewReview {
    NewReview {
        movie_id: movie_id.to_hex(),
        text: "Worth a watch".to_string(),
        stars: Some(stars),
        name: "kat".to_string(),
        user_id: user_id.to_string(),
    }
}

fn new_request(title: &str, user_id: &str) -> NewMovieRequest {
    NewMovieRequest {
        title: title.to_string(),
        year: Some(2020),
        fullplot: Some("A secret agent manipulates time.".to_string()),
        genres: vec!["Action".to_string(), "Sci-Fi".to_string()],
        runtime: Some(150),
        released: Some("2020-08-26".to_string()),
        rated: Some("PG-13".to_string()),
        user_id: user_id.to_string(),
        active: None,
    }
}

async fn first_movie_id(catalog: &Catalog) -> ObjectId {
    catalog
        .list_movies(&MovieFilters::default(), Page::default())
        .await
        .unwrap()[0]
        .id
        .unwrap()
}

#[tokio::test]
async fn test_list_movies_pages_in_imdb_order() {
    let movies = (1..=5)
        .map(|i| movie(&format!("Movie {}", i), 2000 + i, &format!("Plot {}", i), f64::from(i)))
        .collect();
    let (catalog, _) = catalog_with(movies);

    let first = catalog
        .list_movies(&MovieFilters::default(), Page::new(0, 2))
        .await
        .unwrap();
    let also_first = catalog
        .list_movies(&MovieFilters::default(), Page::new(1, 2))
        .await
        .unwrap();
    let third = catalog
        .list_movies(&MovieFilters::default(), Page::new(3, 2))
        .await
        .unwrap();

    assert_eq!(first, also_first);
    assert_eq!(first[0].title, "Movie 5");
    assert_eq!(first[1].title, "Movie 4");
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].title, "Movie 1");
}

#[tokio::test]
async fn test_movie_by_id_errors() {
    let (catalog, _) = catalog_with(vec![]);

    assert!(matches!(
        catalog.movie_by_id("not-an-id").await,
        Err(CatalogError::InvalidId(_))
    ));
    match catalog.movie_by_id(&ObjectId::new().to_hex()).await {
        Err(CatalogError::NotFound(message)) => assert_eq!(message, "Movie Not Found"),
        other => panic!("expected not found, got {:?}", other),
    }
}

#[tokio::test]
async fn test_genres_and_ratings_are_distinct() {
    let mut western = movie("Unforgiven", 1992, "An aging gunslinger", 8.2);
    western.genres = vec!["Drama".to_string(), "Western".to_string()];
    western.rated = Some("R".to_string());
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3), western]);

    assert_eq!(catalog.genres().await.unwrap(), vec!["Drama", "Western"]);
    assert_eq!(catalog.ratings().await.unwrap(), vec!["PG", "R"]);
}

#[tokio::test]
async fn test_add_movie_is_listed() {
    let (catalog, _) = catalog_with(vec![]);
    let payload: NewMovie = serde_json::from_value(serde_json::json!({
        "title": "Tenet",
        "year": "2020",
        "genres": ["Action"],
        "imdb": "7.4,400000,6723592",
        "released": "2020-08-26",
        "rated": "PG-13"
    }))
    .unwrap();

    let id = catalog.add_movie(payload).await.unwrap();
    let detail = catalog.movie_by_id(&id.to_hex()).await.unwrap();
    assert_eq!(detail.movie.title, "Tenet");
    assert_eq!(detail.movie.kind.as_deref(), Some("movie"));
    assert!(detail.reviews.is_empty());
}

#[tokio::test]
async fn test_review_lifecycle() {
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3)]);
    let movie_id = first_movie_id(&catalog).await;

    let review_id = catalog
        .add_review(new_review(movie_id, "kat@example.com", 4))
        .await
        .unwrap();

    let detail = catalog.movie_by_id(&movie_id.to_hex()).await.unwrap();
    let review = &detail.reviews[0];
    assert_eq!(review.id, Some(review_id));
    assert_eq!(review.movie_id, movie_id);
    assert_eq!(review.user_id, "kat@example.com");
    assert_eq!(review.name, "kat");
    assert_eq!(review.text, "Worth a watch");
    assert_eq!(review.num_stars, 4);

    catalog
        .edit_review(EditReview {
            review_id: review_id.to_hex(),
            user_id: "kat@example.com".to_string(),
            text: "Even better the second time".to_string(),
            stars: Some(5),
        })
        .await
        .unwrap();
    let reviews = catalog.reviews_by_user("kat@example.com").await.unwrap();
    assert_eq!(reviews[0].num_stars, 5);
    assert_eq!(reviews[0].text, "Even better the second time");

    catalog
        .delete_review(&review_id.to_hex(), "kat@example.com")
        .await
        .unwrap();
    assert!(catalog.reviews_by_user("kat@example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_only_author_edits_or_deletes_review() {
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3)]);
    let movie_id = first_movie_id(&catalog).await;
    let review_id = catalog
        .add_review(new_review(movie_id, "kat@example.com", 4))
        .await
        .unwrap();

    let edit = catalog
        .edit_review(EditReview {
            review_id: review_id.to_hex(),
            user_id: "mallory@example.com".to_string(),
            text: "Terrible".to_string(),
            stars: Some(1),
        })
        .await;
    assert!(matches!(edit, Err(CatalogError::NotOwner(_))));

    let delete = catalog
        .delete_review(&review_id.to_hex(), "mallory@example.com")
        .await;
    assert!(matches!(delete, Err(CatalogError::NotOwner(_))));

    let reviews = catalog.reviews_by_user("kat@example.com").await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].text, "Worth a watch");
}

#[tokio::test]
async fn test_review_stars_are_validated() {
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3)]);
    let movie_id = first_movie_id(&catalog).await;

    let result = catalog.add_review(new_review(movie_id, "kat@example.com", 6)).await;
    assert!(matches!(
        result,
        Err(CatalogError::InvalidPayload(PayloadError::InvalidStars(6)))
    ));

    let mut missing = new_review(movie_id, "kat@example.com", 3);
    missing.stars = None;
    assert!(matches!(
        catalog.add_review(missing).await,
        Err(CatalogError::InvalidPayload(PayloadError::MissingField("stars")))
    ));
}

#[tokio::test]
async fn test_movies_reviewed_keeps_review_order() {
    let (catalog, store) = catalog_with(vec![
        movie("Heat", 1995, "Robbers", 8.3),
        movie("Alien", 1979, "Crew", 8.5),
    ]);
    let movies = catalog
        .list_movies(&MovieFilters::default(), Page::default())
        .await
        .unwrap();
    let alien = movies[0].id.unwrap();
    let heat = movies[1].id.unwrap();

    catalog.add_review(new_review(heat, "kat@example.com", 5)).await.unwrap();
    catalog.add_review(new_review(alien, "kat@example.com", 2)).await.unwrap();
    store.delete_movie(alien).await.unwrap();

    let reviewed = catalog.movies_reviewed_by("kat@example.com").await.unwrap();
    assert_eq!(reviewed.len(), 2);
    assert_eq!(reviewed[0].as_ref().unwrap().movie.title, "Heat");
    assert!(reviewed[1].is_none());
}

#[tokio::test]
async fn test_rename_review_author() {
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3)]);
    let movie_id = first_movie_id(&catalog).await;
    let first = catalog.add_review(new_review(movie_id, "kat@example.com", 5)).await.unwrap();
    catalog.add_review(new_review(movie_id, "kat@example.com", 3)).await.unwrap();

    let count = catalog
        .rename_review_author(RenameReviewAuthor {
            review_id: first.to_hex(),
            new_user_name: "katniss".to_string(),
        })
        .await
        .unwrap();
    assert_eq!((count.matched, count.modified), (1, 1));

    let modified = catalog
        .rename_author_everywhere("kat@example.com", "katniss")
        .await
        .unwrap();
    assert_eq!(modified, 1);
}

#[tokio::test]
async fn test_delete_duplicates_keeps_oldest() {
    let original = movie("Heat", 1995, "Robbers", 8.3);
    let copy = original.clone();
    let remake = movie("Heat", 1986, "Robbers", 5.0);
    let (catalog, _) = catalog_with(vec![
        original,
        copy,
        movie("Alien", 1979, "Crew", 8.5),
    ]);
    let before = catalog
        .list_movies(&MovieFilters::default(), Page::default())
        .await
        .unwrap();
    let oldest_heat = before
        .iter()
        .filter(|m| m.title == "Heat")
        .filter_map(|m| m.id)
        .min()
        .unwrap();

    let report = catalog.delete_duplicates().await.unwrap();
    assert_eq!(report.sets.len(), 1);
    assert_eq!(report.deleted, 1);
    assert!(report.all_deleted());
    assert_eq!(report.sets[0].keep, oldest_heat);

    let after = catalog
        .list_movies(&MovieFilters::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(after.len(), 2);

    let again = catalog.delete_duplicates().await.unwrap();
    assert!(again.nothing_to_delete());

    // Same plot and title but another year is a remake, not a copy
    let (catalog, _) = catalog_with(vec![movie("Heat", 1995, "Robbers", 8.3), remake]);
    assert!(catalog.delete_duplicates().await.unwrap().nothing_to_delete());
}

#[tokio::test]
async fn test_submitted_request_is_pending() {
    let (catalog, _) = catalog_with(vec![]);
    catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();

    let requests = catalog.requests_by_user("kat@example.com").await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, RequestStatus::Pending);
    assert!(requests[0].active);
    assert_eq!(catalog.all_requests().await.unwrap().len(), 1);
    assert!(catalog.requests_by_user("bo@example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deny_keeps_active_and_is_final() {
    let (catalog, store) = catalog_with(vec![]);
    let id = catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();
    let action = RequestAction {
        id: id.to_hex(),
        user_id: "kat@example.com".to_string(),
    };

    assert!(catalog.deny_request(action.clone()).await.unwrap());
    let request = &store.requests_by_user("kat@example.com").await.unwrap()[0];
    assert_eq!(request.status, RequestStatus::Denied);
    assert!(request.active);

    // Decided requests cannot be decided again
    assert!(!catalog.deny_request(action).await.unwrap());
}

#[tokio::test]
async fn test_deny_after_deactivate_keeps_it_hidden() {
    let (catalog, store) = catalog_with(vec![]);
    let id = catalog
        .submit_request(new_request("Dune", "kat@example.com"))
        .await
        .unwrap();
    let action = RequestAction {
        id: id.to_hex(),
        user_id: "kat@example.com".to_string(),
    };

    assert!(catalog.deactivate_request(action.clone()).await.unwrap());
    assert!(catalog.deny_request(action).await.unwrap());

    let request = &store.requests_by_user("kat@example.com").await.unwrap()[0];
    assert_eq!(request.status, RequestStatus::Denied);
    assert!(!request.active);
}

#[tokio::test]
async fn test_deactivate_keeps_status() {
    let (catalog, store) = catalog_with(vec![]);
    let id = catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();
    let action = RequestAction {
        id: id.to_hex(),
        user_id: "kat@example.com".to_string(),
    };

    assert!(catalog.deactivate_request(action.clone()).await.unwrap());
    let request = &store.requests_by_user("kat@example.com").await.unwrap()[0];
    assert_eq!(request.status, RequestStatus::Pending);
    assert!(!request.active);

    assert!(!catalog.deactivate_request(action).await.unwrap());
}

#[tokio::test]
async fn test_delete_request_requires_owner() {
    let (catalog, _) = catalog_with(vec![]);
    let id = catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();

    assert!(!catalog.delete_request(&id.to_hex(), "mallory@example.com").await.unwrap());
    assert!(catalog.delete_request(&id.to_hex(), "kat@example.com").await.unwrap());
    assert!(catalog.all_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_accept_links_added_movie() {
    let mut tenet = movie("Tenet", 2020, "A secret agent manipulates time.", 7.4);
    tenet.genres = vec!["Action".to_string(), "Sci-Fi".to_string()];
    tenet.rated = Some("PG-13".to_string());
    let (catalog, store) = catalog_with(vec![tenet]);
    let movie_id = first_movie_id(&catalog).await;
    let id = catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();

    let accept = AcceptRequest {
        id: id.to_hex(),
        user_id: "kat@example.com".to_string(),
        title: "Tenet".to_string(),
        year: Some(2020),
        genres: vec!["Action".to_string()],
        rated: Some("PG-13".to_string()),
    };
    assert!(catalog.accept_request(accept.clone()).await.unwrap());

    let request = &store.all_requests().await.unwrap()[0];
    assert_eq!(request.status, RequestStatus::Accepted);
    assert_eq!(request.movie_id, Some(movie_id));

    // Already accepted
    assert!(!catalog.accept_request(accept).await.unwrap());
}

#[tokio::test]
async fn test_accept_without_movie_is_not_found() {
    let (catalog, _) = catalog_with(vec![]);
    let id = catalog
        .submit_request(new_request("Tenet", "kat@example.com"))
        .await
        .unwrap();

    let result = catalog
        .accept_request(AcceptRequest {
            id: id.to_hex(),
            user_id: "kat@example.com".to_string(),
            title: "Tenet".to_string(),
            year: Some(2020),
            genres: vec!["Action".to_string()],
            rated: Some("PG-13".to_string()),
        })
        .await;
    assert!(matches!(result, Err(CatalogError::NotFound(_))));
}
