//! Per-call options for store operations.

use bson::{Document, doc};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

/// Sort specification for query results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }

    /// Renders this sort as a store-native sort document (`{field: 1}` or `{field: -1}`).
    pub fn to_document(&self) -> Document {
        doc! {
            self.field.clone(): match self.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            }
        }
    }
}

/// Options for a find-one query.
///
/// When several documents match the filter, `sort` decides which one comes first and
/// `skip` drops that many matches before picking one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOneOptions {
    pub sort: Option<Sort>,
    pub skip: Option<u64>,
}

impl FindOneOptions {
    pub fn builder() -> FindOneOptionsBuilder {
        FindOneOptionsBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOneOptionsBuilder {
    options: FindOneOptions,
}

impl FindOneOptionsBuilder {
    /// Sets the sort specification used to pick among several matches.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.options.sort = Some(sort);
        self
    }

    /// Sets the number of matching documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn build(self) -> FindOneOptions {
        self.options
    }
}

/// Outcome of an update operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of documents matched by the filter.
    pub matched: u64,
    /// Number of documents whose content actually changed.
    pub modified: u64,
}
