use std::cmp::Ordering;

use tracing::debug;

use crate::store::entities::UsageRecord;

use super::{columns::Column, SortOrder};

/// Orders records by the named field. The sort is stable in both directions, so records with
/// equal keys keep their input order. An unknown or missing field returns the input unchanged.
pub fn sort_records(
    mut records: Vec<UsageRecord>,
    sort_by: Option<&str>,
    order: SortOrder,
) -> Vec<UsageRecord> {
    let Some(field) = sort_by else {
        return records;
    };
    let Some(column) = Column::parse(field) else {
        debug!("Unknown sort field {field}, keeping input order");
        return records;
    };

    match order {
        SortOrder::Asc => records.sort_by(|a, b| compare_by(column, a, b)),
        SortOrder::Desc => records.sort_by(|a, b| compare_by(column, a, b).reverse()),
    }
    records
}

pub fn compare_by(column: Column, a: &UsageRecord, b: &UsageRecord) -> Ordering {
    match column {
        Column::Application => a.application.cmp(&b.application),
        Column::TotalHours => a.total_hours.total_cmp(&b.total_hours),
        Column::Sessions => a.usage_count.cmp(&b.usage_count),
        Column::AvgSession => a.avg_session().total_cmp(&b.avg_session()),
        Column::Computer => a.computer_name.cmp(&b.computer_name),
        Column::IpAddress => a.ip_address.cmp(&b.ip_address),
        Column::User => a.username.cmp(&b.username),
        Column::LastActivity => a.last_activity.cmp(&b.last_activity),
    }
}
