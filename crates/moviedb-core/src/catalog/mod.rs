//! Validation and workflow on top of a [`Store`].

use bson::oid::ObjectId;
use moviedb_identity::IdentityError;
use moviedb_models::PayloadError;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{Store, StoreError};

mod movies;
mod requests;
mod reviews;

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid id '{0}'")]
    InvalidId(String),

    #[error(transparent)]
    InvalidPayload(#[from] PayloadError),

    #[error("{0}")]
    NotFound(String),

    #[error("Unable to {0} as user may not be original poster")]
    NotOwner(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Parse a 24 character hex ObjectId sent by the frontend.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, CatalogError> {
    ObjectId::parse_str(raw.trim()).map_err(|_| CatalogError::InvalidId(raw.to_string()))
}

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn Store>,
}

impl Catalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}
