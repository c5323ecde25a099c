use bson::oid::ObjectId;
use bson::{Bson, DateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::json::to_api_json;
use crate::lenient;
use crate::review::Review;

/// A document in the `movies` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Movie {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::opt_i32", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullplot: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32", skip_serializing_if = "Option::is_none")]
    pub runtime: Option<i32>, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb: Option<Imdb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    // Imported documents store this as a string, documents created here as a date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastupdated: Option<Bson>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Imdb {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub votes: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
}

impl Imdb {
    /// Parse the `"rating,votes,id"` triple the movie form submits.
    ///
    /// Missing or unparsable components are left empty rather than
    /// rejecting the movie.
    pub fn from_triple(raw: &str) -> Self {
        let mut parts = raw.split(',');
        let rating = parts.next().and_then(lenient::parse_float_prefix);
        let votes = parts.next().and_then(lenient::parse_int_prefix);
        let id = parts.next().and_then(lenient::parse_int_prefix);
        Self { rating, votes, id }
    }

    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.votes.is_none() && self.id.is_none()
    }
}

/// A movie together with its reviews, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetail {
    pub movie: Movie,
    pub reviews: Vec<Review>,
}

impl MovieDetail {
    /// Render as the movie object with an embedded `reviews` array.
    pub fn to_api_json(&self) -> Result<Value, bson::ser::Error> {
        let mut movie = to_api_json(&self.movie)?;
        let reviews = self
            .reviews
            .iter()
            .map(to_api_json)
            .collect::<Result<Vec<_>, _>>()?;
        if let Value::Object(map) = &mut movie {
            map.insert("reviews".to_string(), Value::Array(reviews));
        }
        Ok(movie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_imdb_from_triple() {
        let imdb = Imdb::from_triple("7.4,12000,1234567");
        assert_eq!(imdb.rating, Some(7.4));
        assert_eq!(imdb.votes, Some(12000));
        assert_eq!(imdb.id, Some(1234567));
    }

    #[test]
    fn test_imdb_from_partial_triple() {
        let imdb = Imdb::from_triple("8.2");
        assert_eq!(imdb.rating, Some(8.2));
        assert_eq!(imdb.votes, None);
        assert_eq!(imdb.id, None);

        assert!(Imdb::from_triple("").is_empty());
        assert!(Imdb::from_triple("n/a,,").is_empty());
    }

    #[test]
    fn test_movie_decodes_imported_document() {
        let document = doc! {
            "_id": ObjectId::new(),
            "title": "The Great Train Robbery",
            "year": 1903,
            "genres": ["Short", "Western"],
            "runtime": 11,
            "rated": "TV-G",
            "imdb": { "rating": "", "votes": 9847, "id": 439 },
            "lastupdated": "2015-08-13 00:27:59.177000000",
            "type": "movie",
            "cast": ["A.C. Abadie"],
        };

        let movie: Movie = bson::from_document(document).unwrap();
        assert_eq!(movie.title, "The Great Train Robbery");
        assert_eq!(movie.year, Some(1903));
        assert_eq!(movie.genres, vec!["Short", "Western"]);
        let imdb = movie.imdb.unwrap();
        assert_eq!(imdb.rating, None);
        assert_eq!(imdb.votes, Some(9847));
        assert_eq!(movie.kind.as_deref(), Some("movie"));
    }

    #[test]
    fn test_movie_detail_embeds_reviews() {
        let movie_id = ObjectId::new();
        let detail = MovieDetail {
            movie: Movie {
                id: Some(movie_id),
                title: "Heat".to_string(),
                ..Movie::default()
            },
            reviews: vec![Review {
                id: Some(ObjectId::new()),
                movie_id,
                user_id: "neil@example.com".to_string(),
                name: "neil".to_string(),
                text: "Great".to_string(),
                num_stars: 5,
                date: DateTime::now(),
            }],
        };

        let json = detail.to_api_json().unwrap();
        assert_eq!(json["_id"], movie_id.to_hex());
        assert_eq!(json["reviews"][0]["movie_id"], movie_id.to_hex());
        assert_eq!(json["reviews"][0]["num_stars"], 5);
    }
}
