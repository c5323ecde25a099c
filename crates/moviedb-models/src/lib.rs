pub mod json;
pub mod lenient;
pub mod movie;
pub mod movie_request;
pub mod payload;
pub mod review;
pub mod status;
pub mod user;

pub use bson::oid::ObjectId;
pub use json::{bson_to_json, to_api_json};
pub use movie::{Imdb, Movie, MovieDetail};
pub use movie_request::MovieRequest;
pub use payload::PayloadError;
pub use review::Review;
pub use status::RequestStatus;
pub use user::{ProviderUser, Role};
