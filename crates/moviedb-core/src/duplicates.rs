//! Duplicate movie detection.
//!
//! Imports of the sample data set occasionally insert the same movie twice.
//! Copies share their full plot, title and year; they are grouped by plot
//! and everything but the oldest document of a qualifying group is removed.

use bson::oid::ObjectId;
use serde::Serialize;

/// Answer of the dedupe endpoint when no group qualifies.
pub const NO_DUPLICATES: &str = "No duplicates to delete";

/// Movies sharing one `fullplot` value, with the distinct titles and years
/// found among them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotGroup {
    pub fullplot: Option<String>,
    pub ids: Vec<ObjectId>,
    pub titles: Vec<String>,
    pub years: Vec<i32>,
}

impl PlotGroup {
    /// More than one member, a single title and a single year.
    pub fn has_duplicates(&self) -> bool {
        self.ids.len() > 1 && self.titles.len() == 1 && self.years.len() == 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateSet {
    pub title: String,
    pub year: i32,
    /// Oldest copy, left in place
    pub keep: ObjectId,
    pub extra: Vec<ObjectId>,
}

pub fn find_duplicates(groups: Vec<PlotGroup>) -> Vec<DuplicateSet> {
    let mut sets: Vec<DuplicateSet> = groups
        .into_iter()
        .filter(PlotGroup::has_duplicates)
        .filter_map(|mut group| {
            // ObjectIds start with their creation time
            group.ids.sort();
            group.ids.dedup();
            let keep = *group.ids.first()?;
            let extra = group.ids.split_off(1);
            if extra.is_empty() {
                return None;
            }
            Some(DuplicateSet {
                title: group.titles.pop()?,
                year: group.years.pop()?,
                keep,
                extra,
            })
        })
        .collect();
    sets.sort_by(|a, b| a.title.cmp(&b.title).then(a.year.cmp(&b.year)));
    sets
}

/// Outcome of a dedupe run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DedupeReport {
    pub sets: Vec<DuplicateSet>,
    pub deleted: u64,
    /// Extra copies the store did not delete
    pub failed: Vec<ObjectId>,
}

impl DedupeReport {
    pub fn nothing_to_delete(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn all_deleted(&self) -> bool {
        self.failed.is_empty()
    }
}
