use std::collections::HashSet;

use crate::store::entities::UsageRecord;

use super::{columns::Column, QueryParams};

/// Placeholder application name emitted before the user picks anything. Never displayed.
pub const UNSET_APPLICATION: &str = "Pick an app";

/// Returns the records matching every criterion of `params`, in input order.
///
/// The date range is not checked here: the record store already applied it when fetching.
pub fn filter_records(records: &[UsageRecord], params: &QueryParams) -> Vec<UsageRecord> {
    let matcher = RecordMatcher::new(params);
    records
        .iter()
        .filter(|record| matcher.matches(record))
        .cloned()
        .collect()
}

/// Usernames in order of first appearance.
pub fn distinct_users(records: &[UsageRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|record| seen.insert(record.username.as_str()))
        .map(|record| record.username.clone())
        .collect()
}

/// [QueryParams] with its text criteria lowercased once up front.
struct RecordMatcher<'a> {
    username: Option<&'a str>,
    search: Option<String>,
    columns: Vec<(Column, String)>,
}

impl<'a> RecordMatcher<'a> {
    fn new(params: &'a QueryParams) -> Self {
        Self {
            username: params.username.as_deref(),
            search: params
                .search_term
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(str::to_lowercase),
            columns: params
                .column_filters
                .iter()
                .filter(|v| !v.text.is_empty())
                .map(|v| (v.column, v.text.to_lowercase()))
                .collect(),
        }
    }

    fn matches(&self, record: &UsageRecord) -> bool {
        if record.application.is_empty() || record.application == UNSET_APPLICATION {
            return false;
        }

        if let Some(username) = self.username {
            if record.username != username {
                return false;
            }
        }

        if let Some(search) = &self.search {
            if !record.application.to_lowercase().contains(search)
                && !record.username.to_lowercase().contains(search)
            {
                return false;
            }
        }

        self.columns
            .iter()
            .all(|(column, text)| column.text(record).to_lowercase().contains(text))
    }
}
