//! Request bodies posted by the frontend.
//!
//! Field names follow the frontend's wire format (`userName`, `profilePic`,
//! ...). Numeric form fields arrive as strings and go through the lenient
//! decoders.

use bson::{Bson, DateTime};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::lenient;
use crate::movie::{Imdb, Movie};
use crate::movie_request::MovieRequest;
use crate::status::RequestStatus;

pub const MOVIE_KIND: &str = "movie";

#[derive(Error, Debug, PartialEq)]
pub enum PayloadError {
    #[error("Invalid release date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Star rating must be between 1 and 5, got {0}")]
    InvalidStars(i32),
}

/// Parse a `YYYY-MM-DD` release date into a UTC midnight timestamp.
pub fn parse_release_date(raw: &str) -> Result<DateTime, PayloadError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PayloadError::InvalidDate(raw.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PayloadError::InvalidDate(raw.to_string()))?;
    Ok(DateTime::from_chrono(midnight.and_utc()))
}

fn optional_release_date(raw: Option<&str>) -> Result<Option<DateTime>, PayloadError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_release_date(raw).map(Some),
    }
}

/// `POST /addMovie`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub year: Option<i32>,
    #[serde(default)]
    pub fullplot: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    /// `"rating,votes,id"`
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub imdb: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
}

impl NewMovie {
    pub fn into_movie(self, now: DateTime) -> Result<Movie, PayloadError> {
        if self.title.trim().is_empty() {
            return Err(PayloadError::MissingField("title"));
        }
        let released = optional_release_date(self.released.as_deref())?;
        let imdb = self
            .imdb
            .as_deref()
            .map(Imdb::from_triple)
            .filter(|imdb| !imdb.is_empty());

        Ok(Movie {
            id: None,
            title: self.title,
            year: self.year,
            fullplot: self.fullplot,
            genres: self.genres,
            runtime: self.runtime,
            released,
            rated: self.rated,
            imdb,
            poster: self.poster,
            lastupdated: Some(Bson::DateTime(now)),
            kind: Some(MOVIE_KIND.to_string()),
        })
    }
}

/// `POST /reviews`
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    pub movie_id: String,
    pub text: String,
    #[serde(deserialize_with = "lenient::opt_i32")]
    pub stars: Option<i32>,
    pub name: String,
    pub user_id: String,
}

/// `PUT /reviews`
#[derive(Debug, Clone, Deserialize)]
pub struct EditReview {
    pub review_id: String,
    pub user_id: String,
    pub text: String,
    #[serde(deserialize_with = "lenient::opt_i32")]
    pub stars: Option<i32>,
}

/// Body of the `DELETE` routes: who is asking.
#[derive(Debug, Clone, Deserialize)]
pub struct Requester {
    pub user_id: String,
}

/// `PUT /reviewsUpdateUserName`
#[derive(Debug, Clone, Deserialize)]
pub struct RenameReviewAuthor {
    pub review_id: String,
    #[serde(rename = "newUserName")]
    pub new_user_name: String,
}

/// `POST /addRequest`
#[derive(Debug, Clone, Deserialize)]
pub struct NewMovieRequest {
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub year: Option<i32>,
    #[serde(default)]
    pub fullplot: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
    pub user_id: String,
    #[serde(default)]
    pub active: Option<bool>,
}

impl NewMovieRequest {
    /// Build the stored request. New requests always start out pending,
    /// whatever status the client sent.
    pub fn into_request(self, now: DateTime) -> Result<MovieRequest, PayloadError> {
        if self.title.trim().is_empty() {
            return Err(PayloadError::MissingField("title"));
        }
        if self.user_id.trim().is_empty() {
            return Err(PayloadError::MissingField("user_id"));
        }
        let released = optional_release_date(self.released.as_deref())?;

        Ok(MovieRequest {
            id: None,
            title: self.title,
            year: self.year,
            fullplot: self.fullplot,
            genres: self.genres,
            runtime: self.runtime,
            released,
            rated: self.rated,
            lastupdated: Some(now),
            kind: Some(MOVIE_KIND.to_string()),
            user_id: self.user_id,
            status: RequestStatus::Pending,
            active: self.active.unwrap_or(true),
            movie_id: None,
        })
    }
}

/// `PUT /denyRequest`, `PUT /deactivateRequest`
#[derive(Debug, Clone, Deserialize)]
pub struct RequestAction {
    pub id: String,
    pub user_id: String,
}

/// `PUT /acceptRequest`: identifies the request and the movie the admin just
/// added for it.
#[derive(Debug, Clone, Deserialize)]
pub struct AcceptRequest {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub rated: Option<String>,
}

/// `PUT /changeUserName`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeUserName {
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    /// When present, the new name is also written to this user's reviews.
    #[serde(default)]
    pub email: Option<String>,
}

/// `PUT /changePassword`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    #[serde(rename = "userEmail")]
    pub user_email: String,
}

/// `PUT /changepfp`
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePicture {
    pub user_id: String,
    #[serde(rename = "profilePic")]
    pub profile_pic: String,
}

/// `PUT /account`
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteAccount {
    pub user_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_date() {
        let date = parse_release_date("1995-12-15").unwrap();
        assert_eq!(date.try_to_rfc3339_string().unwrap(), "1995-12-15T00:00:00Z");

        assert_eq!(
            parse_release_date("15/12/1995"),
            Err(PayloadError::InvalidDate("15/12/1995".to_string()))
        );
        assert!(parse_release_date("1995-13-01").is_err());
    }

    #[test]
    fn test_new_movie_from_form_values() {
        let body = r#"{
            "title": "Heat",
            "year": "1995",
            "fullplot": "A group of professional bank robbers...",
            "genres": ["Action", "Crime"],
            "imdb": "8.3,512000,113277",
            "poster": "https://example.com/heat.jpg",
            "runtime": "170",
            "released": "1995-12-15",
            "rated": "R"
        }"#;
        let payload: NewMovie = serde_json::from_str(body).unwrap();
        let now = DateTime::now();
        let movie = payload.into_movie(now).unwrap();

        assert_eq!(movie.year, Some(1995));
        assert_eq!(movie.runtime, Some(170));
        let imdb = movie.imdb.unwrap();
        assert_eq!(imdb.rating, Some(8.3));
        assert_eq!(imdb.votes, Some(512000));
        assert_eq!(imdb.id, Some(113277));
        assert_eq!(movie.kind.as_deref(), Some("movie"));
        assert_eq!(movie.lastupdated, Some(Bson::DateTime(now)));
        assert!(movie.released.is_some());
    }

    #[test]
    fn test_new_movie_requires_title() {
        let payload: NewMovie = serde_json::from_str(r#"{"title": "  "}"#).unwrap();
        assert_eq!(
            payload.into_movie(DateTime::now()),
            Err(PayloadError::MissingField("title"))
        );
    }

    #[test]
    fn test_new_request_is_always_pending() {
        let body = r#"{
            "title": "Tenet",
            "year": 2020,
            "genres": ["Action"],
            "released": "2020-08-26",
            "user_id": "kat@example.com",
            "status": "accepted",
            "active": true
        }"#;
        let payload: NewMovieRequest = serde_json::from_str(body).unwrap();
        let request = payload.into_request(DateTime::now()).unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.active);
        assert!(request.movie_id.is_none());
    }

    #[test]
    fn test_frontend_field_names() {
        let change: ChangeUserName =
            serde_json::from_str(r#"{"user_id": "abc", "userName": "neo"}"#).unwrap();
        assert_eq!(change.user_name, "neo");
        assert!(change.email.is_none());

        let pic: ChangePicture =
            serde_json::from_str(r#"{"user_id": "abc", "profilePic": "https://x/y.png"}"#).unwrap();
        assert_eq!(pic.profile_pic, "https://x/y.png");

        let review: NewReview = serde_json::from_str(
            r#"{"movie_id": "573a1390f29313caabcd4135", "text": "ok", "stars": "4", "name": "neo", "user_id": "neo@example.com"}"#,
        )
        .unwrap();
        assert_eq!(review.stars, Some(4));
    }
}
