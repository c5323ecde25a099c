pub mod accounts;
pub mod catalog;
pub mod duplicates;
pub mod query;
pub mod store;

pub use accounts::Accounts;
pub use catalog::{Catalog, CatalogError};
pub use duplicates::{DedupeReport, DuplicateSet, PlotGroup, NO_DUPLICATES};
pub use query::{MovieFilters, Page};
pub use store::{InMemoryStore, MongoStore, Store, StoreError, UpdateCount};
