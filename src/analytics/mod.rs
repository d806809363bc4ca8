//! Summary statistics over a set of usage records: totals, top applications, productivity and
//! the category breakdown shown on the dashboard.

pub mod categories;
pub mod summary;

use serde::Serialize;
use tracing::instrument;

use crate::{store::entities::UsageRecord, utils::percentage::Percentage};

use categories::{category_breakdown, is_productive, CategoryBucket, CategoryMatching};

pub const NOT_AVAILABLE: &str = "N/A";

pub const TOP_APPS_LIMIT: usize = 10;

/// Divisor of the daily average. The window is assumed to be a week whatever the queried range.
pub const REPORTING_WINDOW_DAYS: f64 = 7.;

/// Productivity above this counts as good focus.
pub const FOCUS_THRESHOLD: f64 = 60.;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsageConsistency {
    High,
    Moderate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Focus {
    Great,
    NeedsWork,
}

/// Observations derived from the report numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    /// Hours per session over all records.
    pub average_session: f64,
    pub least_used_app: String,
    pub most_productive_category: String,
    pub usage_consistency: UsageConsistency,
    pub focus: Focus,
    /// Number of applications in the top list.
    pub app_diversity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_hours: f64,
    pub total_sessions: u64,
    pub most_used_app: String,
    pub productivity_score: Percentage,
    pub daily_average: f64,
    pub top_apps: Vec<UsageRecord>,
    pub category_breakdown: Vec<CategoryBucket>,
    pub insights: Insights,
}

impl Default for AnalyticsReport {
    fn default() -> Self {
        Self {
            total_hours: 0.,
            total_sessions: 0,
            most_used_app: NOT_AVAILABLE.into(),
            productivity_score: Percentage::ZERO,
            daily_average: 0.,
            top_apps: vec![],
            category_breakdown: vec![],
            insights: Insights {
                average_session: 0.,
                least_used_app: NOT_AVAILABLE.into(),
                most_productive_category: NOT_AVAILABLE.into(),
                usage_consistency: UsageConsistency::Moderate,
                focus: Focus::NeedsWork,
                app_diversity: 0,
            },
        }
    }
}

/// Computes the dashboard report. An empty input gives [AnalyticsReport::default].
#[instrument(skip(records), fields(records = records.len()))]
pub fn aggregate(records: &[UsageRecord], matching: CategoryMatching) -> AnalyticsReport {
    if records.is_empty() {
        return AnalyticsReport::default();
    }

    let total_hours = records.iter().map(|v| v.total_hours).sum::<f64>();
    let total_sessions = records.iter().map(|v| v.usage_count).sum::<u64>();

    let most_used_app = most_used(records)
        .map(|v| v.application.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.into());

    let productive_hours = records
        .iter()
        .filter(|v| is_productive(&v.application))
        .map(|v| v.total_hours)
        .sum::<f64>();
    let productivity_score = Percentage::of(productive_hours, total_hours);

    let top_apps = top_apps(records, TOP_APPS_LIMIT);
    let category_breakdown = category_breakdown(records, total_hours, matching);

    let insights = Insights {
        average_session: if total_sessions > 0 {
            total_hours / total_sessions as f64
        } else {
            0.
        },
        least_used_app: top_apps
            .last()
            .map(|v| v.application.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.into()),
        most_productive_category: largest_bucket(&category_breakdown)
            .map(|v| v.category.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.into()),
        usage_consistency: if total_sessions > top_apps.len() as u64 {
            UsageConsistency::High
        } else {
            UsageConsistency::Moderate
        },
        focus: if *productivity_score > FOCUS_THRESHOLD {
            Focus::Great
        } else {
            Focus::NeedsWork
        },
        app_diversity: top_apps.len(),
    };

    AnalyticsReport {
        total_hours,
        total_sessions,
        most_used_app,
        productivity_score,
        daily_average: total_hours / REPORTING_WINDOW_DAYS,
        top_apps,
        category_breakdown,
        insights,
    }
}

/// Record with the most hours. The earliest one wins a tie.
fn most_used(records: &[UsageRecord]) -> Option<&UsageRecord> {
    records.iter().fold(None, |best, current| match best {
        Some(best) if best.total_hours >= current.total_hours => Some(best),
        _ => Some(current),
    })
}

/// Records by hours descending, ties in input order, truncated to `limit`.
pub fn top_apps(records: &[UsageRecord], limit: usize) -> Vec<UsageRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.total_hours.total_cmp(&a.total_hours));
    sorted.truncate(limit);
    sorted
}

fn largest_bucket(buckets: &[CategoryBucket]) -> Option<&CategoryBucket> {
    buckets.iter().fold(None, |best, current| match best {
        Some(best) if best.hours >= current.hours => Some(best),
        _ => Some(current),
    })
}
