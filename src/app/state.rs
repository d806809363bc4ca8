use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    analytics::{
        aggregate,
        categories::CategoryMatching,
        summary::{ProcessSummary, TableSummary},
        AnalyticsReport,
    },
    export::ExportFormat,
    query::{
        filter::{distinct_users, filter_records},
        pagination::{PageState, DEFAULT_PAGE_SIZE},
        sort::sort_records,
        ColumnFilter, QueryParams, SortOrder, DEFAULT_SORT_FIELD,
    },
    settings::{Settings, Theme},
    store::entities::{ProcessRecord, UsageRecord},
};

use super::notifications::{NotificationCenter, NotificationKind};

/// Identifies one fetch. Only the most recently issued ticket may apply its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone)]
pub enum Action {
    SetDateRange {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    /// `None` selects all users.
    SelectUser(Option<String>),
    SetSearch(String),
    SetSort {
        field: String,
        order: SortOrder,
    },
    /// Sorts by `field`, flipping the order when it already is the sort field.
    ToggleSort(String),
    AddColumnFilter(ColumnFilter),
    ClearColumnFilters,
    SetCategoryMatching(CategoryMatching),
    SetPageSize(usize),
    GotoPage(usize),
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    FetchCompleted {
        ticket: FetchTicket,
        usage: Vec<UsageRecord>,
        processes: Vec<ProcessRecord>,
    },
    FetchFailed {
        ticket: FetchTicket,
        at: DateTime<Utc>,
    },
    SetExportFormat(ExportFormat),
    ApplySettings(Settings),
    ToggleTheme,
    Notify {
        kind: NotificationKind,
        message: String,
        at: DateTime<Utc>,
    },
    ExpireNotifications(DateTime<Utc>),
}

/// Everything the dashboard shows, changed only through [AppState::reduce].
#[derive(Debug, Clone)]
pub struct AppState {
    pub records: Vec<UsageRecord>,
    pub process_records: Vec<ProcessRecord>,
    pub users: Vec<String>,
    pub loading: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub selected_user: Option<String>,
    pub search_term: String,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub column_filters: Vec<ColumnFilter>,
    pub category_matching: CategoryMatching,
    pub page: PageState,
    pub theme: Theme,
    pub export_format: ExportFormat,
    pub auto_refresh: bool,
    pub refresh_interval: u64,
    pub notifications: NotificationCenter,
    generation: u64,
}

impl Default for AppState {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            records: vec![],
            process_records: vec![],
            users: vec![],
            loading: false,
            start_date: None,
            end_date: None,
            selected_user: None,
            search_term: String::new(),
            sort_by: DEFAULT_SORT_FIELD.into(),
            sort_order: SortOrder::Desc,
            column_filters: vec![],
            category_matching: CategoryMatching::default(),
            page: PageState::new(DEFAULT_PAGE_SIZE),
            theme: settings.theme,
            export_format: settings.export_format,
            auto_refresh: settings.auto_refresh,
            refresh_interval: settings.refresh_interval,
            notifications: NotificationCenter::default(),
            generation: 0,
        }
    }
}

impl AppState {
    /// Issues a ticket for a new fetch, superseding every earlier one.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket(self.generation)
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }

    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::SetDateRange { start, end } => {
                self.start_date = start;
                self.end_date = end;
                self.page.reset();
            }
            Action::SelectUser(user) => {
                self.selected_user = user;
                self.page.reset();
            }
            Action::SetSearch(term) => {
                self.search_term = term;
                self.page.reset();
            }
            Action::SetSort { field, order } => {
                self.sort_by = field;
                self.sort_order = order;
            }
            Action::ToggleSort(field) => {
                if self.sort_by == field {
                    self.sort_order = match self.sort_order {
                        SortOrder::Asc => SortOrder::Desc,
                        SortOrder::Desc => SortOrder::Asc,
                    };
                } else {
                    self.sort_by = field;
                    self.sort_order = SortOrder::Desc;
                }
            }
            Action::AddColumnFilter(filter) => {
                self.column_filters.retain(|v| v.column != filter.column);
                if !filter.text.is_empty() {
                    self.column_filters.push(filter);
                }
                self.page.reset();
            }
            Action::ClearColumnFilters => {
                self.column_filters.clear();
                self.page.reset();
            }
            Action::SetCategoryMatching(matching) => self.category_matching = matching,
            Action::SetPageSize(size) => self.page.set_page_size(size),
            Action::GotoPage(index) => {
                let len = self.filtered().len();
                self.page.goto(index, len);
            }
            Action::NextPage => {
                let len = self.filtered().len();
                self.page.next(len);
            }
            Action::PreviousPage => self.page.previous(),
            Action::FirstPage => self.page.first(),
            Action::LastPage => {
                let len = self.filtered().len();
                self.page.last(len);
            }
            Action::FetchCompleted {
                ticket,
                usage,
                processes,
            } => {
                if !self.is_current(ticket) {
                    debug!("Dropping results of superseded fetch {ticket:?}");
                    return;
                }
                self.users = distinct_users(&usage);
                self.records = usage;
                self.process_records = processes;
                self.loading = false;
                self.page.reset();
            }
            Action::FetchFailed { ticket, at } => {
                if !self.is_current(ticket) {
                    debug!("Dropping failure of superseded fetch {ticket:?}");
                    return;
                }
                self.loading = false;
                self.notifications
                    .push(NotificationKind::Error, "Error fetching data", at);
            }
            Action::ApplySettings(settings) => {
                self.theme = settings.theme;
                self.export_format = settings.export_format;
                self.auto_refresh = settings.auto_refresh;
                self.refresh_interval = settings.refresh_interval;
            }
            Action::SetExportFormat(format) => self.export_format = format,
            Action::ToggleTheme => self.theme = self.theme.toggled(),
            Action::Notify { kind, message, at } => {
                self.notifications.push(kind, message, at);
            }
            Action::ExpireNotifications(now) => self.notifications.expire(now),
        }
    }

    /// Query built from the current inputs. An empty search term means no search.
    pub fn query_params(&self) -> QueryParams {
        QueryParams {
            start_date: self.start_date,
            end_date: self.end_date,
            username: self.selected_user.clone(),
            search_term: (!self.search_term.is_empty()).then(|| self.search_term.clone()),
            sort_by: Some(self.sort_by.clone()),
            sort_order: self.sort_order,
            column_filters: self.column_filters.clone(),
        }
    }

    /// Loaded records after filtering and sorting.
    pub fn filtered(&self) -> Vec<UsageRecord> {
        let params = self.query_params();
        sort_records(
            filter_records(&self.records, &params),
            params.sort_by.as_deref(),
            params.sort_order,
        )
    }

    pub fn analytics(&self) -> AnalyticsReport {
        aggregate(&self.filtered(), self.category_matching)
    }

    pub fn quick_stats(&self) -> TableSummary {
        TableSummary::from_records(&self.filtered())
    }

    pub fn process_summary(&self) -> ProcessSummary {
        ProcessSummary::from_records(&self.process_records)
    }
}
