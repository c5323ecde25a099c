use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::lenient;
use crate::status::RequestStatus;

/// A document in the `movie_requests` collection: a movie a user asked the
/// admins to add.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRequest {
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
    pub runtime: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastupdated: Option<DateTime>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub user_id: String, // requester's email
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Set once the request is accepted and the movie exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<ObjectId>,
}

fn default_active() -> bool {
    true
}
