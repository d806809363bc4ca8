//! Tabular query pipeline over usage records: filter, then sort, then paginate.
//! Every stage is a pure function over an immutable snapshot of records.

pub mod columns;
pub mod filter;
pub mod pagination;
pub mod sort;

use std::fmt::Display;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use columns::Column;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Case-insensitive substring filter applied to a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub column: Column,
    pub text: String,
}

impl ColumnFilter {
    pub fn new(column: Column, text: impl Into<String>) -> Self {
        Self {
            column,
            text: text.into(),
        }
    }
}

pub const DEFAULT_SORT_FIELD: &str = "total_hours";

/// Transient description of one query. Built by the caller and dropped once the query ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    /// Inclusive lower bound, applied by the record store.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound, applied by the record store.
    pub end_date: Option<DateTime<Utc>>,
    pub username: Option<String>,
    pub search_term: Option<String>,
    /// Field name as understood by [Column::parse]. Unknown names leave the order untouched.
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub column_filters: Vec<ColumnFilter>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            username: None,
            search_term: None,
            sort_by: Some(DEFAULT_SORT_FIELD.into()),
            sort_order: SortOrder::Desc,
            column_filters: vec![],
        }
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_search(mut self, search_term: impl Into<String>) -> Self {
        self.search_term = Some(search_term.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = sort_order;
        self
    }

    pub fn with_column_filter(mut self, filter: ColumnFilter) -> Self {
        self.column_filters.push(filter);
        self
    }

    pub fn has_date_range(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }

    /// Whether a record timestamp falls into the date range. Without a range everything
    /// matches; with one, records lacking a timestamp never do.
    pub fn in_date_range(&self, moment: Option<DateTime<Utc>>) -> bool {
        if !self.has_date_range() {
            return true;
        }
        let Some(moment) = moment else {
            return false;
        };
        self.start_date.map_or(true, |start| moment >= start)
            && self.end_date.map_or(true, |end| moment <= end)
    }
}
