use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};
use now::DateTimeNow;

use crate::{
    analytics::categories::CategoryMatching,
    query::{columns::Column, ColumnFilter, QueryParams, SortOrder, DEFAULT_SORT_FIELD},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Query options shared by every command that shows records.
#[derive(Debug, Clone, clap::Args)]
pub struct QueryArgs {
    #[arg(
        long = "start",
        short,
        help = "Start of the range. Examples are \"yesterday\", \"1 week ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    start_date: Option<String>,
    #[arg(
        long = "end",
        short,
        help = "End of the range. Examples are \"today\", \"1 hour ago\", \"15/03/2025\", \"12:00 16/03/2025\""
    )]
    end_date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long = "days",
        default_value_t = false,
        help = "Take inputs as whole days. For example if start and end are both 15/03/2025 this option selects the whole day"
    )]
    treat_as_days: bool,
    #[arg(short, long, help = "Only show records of this user")]
    user: Option<String>,
    #[arg(long, help = "Case insensitive text matched against application and user names")]
    search: Option<String>,
    #[arg(long, default_value = DEFAULT_SORT_FIELD, help = "Field to sort by, e.g. app, total_hours, usage_count, avg_session, username, lastActivity")]
    sort_by: String,
    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    order: SortOrder,
    #[arg(
        long = "filter",
        value_parser = parse_column_filter,
        help = "Column filter as COLUMN=TEXT, e.g. app=code. Can be repeated"
    )]
    filters: Vec<ColumnFilter>,
    #[arg(
        long,
        help = "Count every application towards a single category instead of each category it matches"
    )]
    first_match_categories: bool,
}

pub struct ParsedQuery {
    pub params: QueryParams,
    pub matching: CategoryMatching,
}

impl QueryArgs {
    pub fn parse_query(self) -> Result<ParsedQuery> {
        let now = Local::now();
        let dialect: chrono_english::Dialect = self.date_style.into();

        let mut start = parse_date(self.start_date.as_deref(), now, dialect, "start")?;
        let mut end = parse_date(self.end_date.as_deref(), now, dialect, "end")?;
        if self.treat_as_days {
            start = start.map(|v| v.beginning_of_day());
            end = end.map(|v| v.end_of_day());
        }
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(Args::command()
                    .error(
                        clap::error::ErrorKind::ValueValidation,
                        format!("Start {start} is after end {end}"),
                    )
                    .into());
            }
        }

        let mut params = QueryParams::new()
            .with_range(
                start.map(|v| v.with_timezone(&Utc)),
                end.map(|v| v.with_timezone(&Utc)),
            )
            .with_sort(self.sort_by, self.order);
        if let Some(user) = self.user {
            params = params.with_username(user);
        }
        if let Some(search) = self.search {
            params = params.with_search(search);
        }
        for filter in self.filters {
            params = params.with_column_filter(filter);
        }

        Ok(ParsedQuery {
            params,
            matching: if self.first_match_categories {
                CategoryMatching::FirstMatch
            } else {
                CategoryMatching::Overlapping
            },
        })
    }
}

fn parse_date(
    value: Option<&str>,
    now: DateTime<Local>,
    dialect: chrono_english::Dialect,
    name: &str,
) -> Result<Option<DateTime<Local>>> {
    match value.map(|s| parse_date_string(s, now, dialect)) {
        Some(Ok(v)) => Ok(Some(v)),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate {name} date {e}"),
            )
            .into()),
        None => Ok(None),
    }
}

pub fn parse_column_filter(value: &str) -> Result<ColumnFilter, String> {
    let Some((column, text)) = value.split_once('=') else {
        return Err(format!("Expected COLUMN=TEXT, got {value}"));
    };
    let column = Column::parse(column).ok_or_else(|| format!("Unknown column {column}"))?;
    Ok(ColumnFilter::new(column, text))
}
