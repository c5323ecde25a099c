use bson::{doc, Document};
use moviedb_models::Movie;
use std::cmp::Ordering;

/// Default page size of the store layer when a caller does not choose one.
pub const DEFAULT_PER_PAGE: u32 = 20;

/// Optional listing filters. Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilters {
    /// Phrase searched in the text index
    pub title: Option<String>,
    /// Exact genre, matched against any element of `genres`
    pub genre: Option<String>,
    pub rated: Option<String>,
    pub year: Option<i32>,
}

impl MovieFilters {
    /// Mongo query document.
    pub fn to_document(&self) -> Document {
        let mut query = Document::new();
        if let Some(title) = &self.title {
            query.insert("$text", doc! { "$search": format!("\"{}\"", title) });
        }
        if let Some(genre) = &self.genre {
            query.insert("genres", doc! { "$eq": genre });
        }
        if let Some(rated) = &self.rated {
            query.insert("rated", doc! { "$eq": rated });
        }
        if let Some(year) = self.year {
            query.insert("year", doc! { "$eq": year });
        }
        query
    }

    /// Same semantics as [`MovieFilters::to_document`] for movies held in
    /// memory. The title phrase matches case-insensitively.
    pub fn matches(&self, movie: &Movie) -> bool {
        if let Some(title) = &self.title {
            if !movie.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            if !movie.genres.iter().any(|g| g == genre) {
                return false;
            }
        }
        if let Some(rated) = &self.rated {
            if movie.rated.as_deref() != Some(rated.as_str()) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if movie.year != Some(year) {
                return false;
            }
        }
        true
    }
}

/// One page of a listing. Pages count from 1; page 0 is read as page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    pub fn skip(&self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.max(1) - 1)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(0, DEFAULT_PER_PAGE)
    }
}

/// Listing order: highest rated first, then most voted. Movies without
/// imdb data go last.
pub fn sort_document() -> Document {
    doc! { "imdb": -1 }
}

pub fn compare_by_imdb_desc(a: &Movie, b: &Movie) -> Ordering {
    let key = |movie: &Movie| {
        movie
            .imdb
            .as_ref()
            .map(|imdb| (imdb.rating, imdb.votes, imdb.id))
    };
    let (a, b) = (key(a), key(b));
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some((ra, va, ia)), Some((rb, vb, ib))) => rb
            .partial_cmp(&ra)
            .unwrap_or(Ordering::Equal)
            .then(vb.cmp(&va))
            .then(ib.cmp(&ia)),
    }
}
