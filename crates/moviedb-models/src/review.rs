use bson::oid::ObjectId;
use bson::DateTime;
use serde::{Deserialize, Serialize};

/// A document in the `reviews` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub movie_id: ObjectId,
    pub user_id: String, // author's email
    pub name: String,    // author's display name at the time of the last rename
    pub text: String,
    pub num_stars: i32, // 1-5
    pub date: DateTime,
}

pub const MIN_STARS: i32 = 1;
pub const MAX_STARS: i32 = 5;

impl Review {
    pub fn stars_in_range(stars: i32) -> bool {
        (MIN_STARS..=MAX_STARS).contains(&stars)
    }
}
