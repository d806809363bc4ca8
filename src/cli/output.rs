use ansi_term::{Colour, Style};
use chrono::Local;

use crate::{
    analytics::{
        summary::{ProcessSummary, TableSummary},
        AnalyticsReport, Focus,
    },
    app::notifications::{Notification, NotificationKind},
    query::{
        columns::Column,
        pagination::{page_count, PageState},
    },
    store::entities::UsageRecord,
    utils::{
        percentage::Percentage,
        system::{format_size, SystemInfo},
        time::{format_hours, format_hours_clock},
    },
};

fn heading(text: &str) -> String {
    Style::new().bold().underline().paint(text).to_string()
}

fn productivity_colour(score: Percentage) -> Colour {
    if *score >= 70. {
        Colour::Green
    } else if *score >= 40. {
        Colour::Yellow
    } else {
        Colour::Red
    }
}

pub fn print_report(report: &AnalyticsReport, stats: &TableSummary) {
    println!("{}", heading("Overview"));
    println!("Total time\t{}", format_hours(report.total_hours));
    println!("Sessions\t{}", report.total_sessions);
    println!("Most used\t{}", report.most_used_app);
    println!(
        "Productivity\t{}",
        productivity_colour(report.productivity_score).paint(report.productivity_score.to_string())
    );
    println!("Daily average\t{}", format_hours(report.daily_average));
    println!(
        "Tracked\t\t{} applications, {} users",
        stats.unique_apps, stats.unique_users
    );
    println!();

    if !report.top_apps.is_empty() {
        println!("{}", heading("Top applications"));
        for (i, app) in report.top_apps.iter().enumerate() {
            println!(
                "{:>2}. {}\t{}\t{} sessions",
                i + 1,
                app.application,
                format_hours(app.total_hours),
                app.usage_count
            );
        }
        println!();
    }

    if !report.category_breakdown.is_empty() {
        println!("{}", heading("Categories"));
        for bucket in &report.category_breakdown {
            println!(
                "{}\t{}\t{}",
                bucket.category,
                format_hours(bucket.hours),
                bucket.percentage
            );
        }
        println!();
    }

    let insights = &report.insights;
    println!("{}", heading("Insights"));
    println!(
        "Average session\t{}",
        format_hours_clock(insights.average_session)
    );
    println!("Least used\t{}", insights.least_used_app);
    println!("Top category\t{}", insights.most_productive_category);
    println!("Consistency\t{:?}", insights.usage_consistency);
    let focus = match insights.focus {
        Focus::Great => Colour::Green.paint("Great"),
        Focus::NeedsWork => Colour::Yellow.paint("Needs work"),
    };
    println!("Focus\t\t{focus}");
}

pub fn print_table(rows: &[UsageRecord], page: PageState, total: usize, stats: &TableSummary) {
    let header = Column::ALL
        .iter()
        .map(|v| v.header())
        .collect::<Vec<_>>()
        .join("\t");
    println!("{}", Style::new().bold().paint(header));

    for record in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            record.application,
            format_hours(record.total_hours),
            record.usage_count,
            format_hours_clock(record.avg_session()),
            record.computer_name,
            record.ip_address,
            record.username,
            record
                .last_activity
                .map(|v| v.with_timezone(&Local).format("%x %H:%M").to_string())
                .unwrap_or_default(),
        );
    }

    let pages = page_count(total, page.size()).max(1);
    println!();
    println!(
        "Page {} of {}, {total} rows\t{} total, {} sessions, {} avg session",
        page.index() + 1,
        pages,
        format_hours(stats.total_hours),
        stats.total_sessions,
        format_hours_clock(stats.avg_session_time)
    );
    if let Some(hint) = navigation_hint(page, total) {
        println!("{}", Style::new().dimmed().paint(hint));
    }
}

/// Tells which `--page` values lead to the neighbouring pages, if there are any.
fn navigation_hint(page: PageState, total: usize) -> Option<String> {
    let mut hints = vec![];
    if page.can_previous() {
        hints.push(format!("--page {} for the previous page", page.index()));
    }
    if page.can_next(total) {
        hints.push(format!("--page {} for the next page", page.index() + 2));
    }
    (!hints.is_empty()).then(|| hints.join(", "))
}

pub fn print_processes(summary: &ProcessSummary) {
    println!(
        "{} monitored processes in {} applications",
        summary.monitored_processes, summary.parent_applications
    );
    if summary.recent.is_empty() {
        return;
    }
    println!();
    println!("{}", heading("Recent activity"));
    for process in &summary.recent {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            process.process_name,
            process.parent_software,
            process.detection_count,
            process.last_seen.with_timezone(&Local).format("%x %H:%M"),
            process.plugin_path
        );
    }
}

pub fn print_system(info: &SystemInfo, store_size: u64) {
    println!("Computer\t{}", info.computer_name);
    println!("User\t\t{}", info.username);
    println!(
        "Platform\t{} {}",
        info.platform,
        info.os_version.as_deref().unwrap_or_default()
    );
    println!("Architecture\t{}", info.arch);
    println!("IP address\t{}", info.ip_address);
    println!(
        "Memory\t\t{} free of {}",
        format_size(info.free_memory),
        format_size(info.total_memory)
    );
    println!("Uptime\t\t{}", format_hours(info.uptime as f64 / 3600.));
    println!("Stored records\t{}", format_size(store_size));
}

pub fn print_notifications(notifications: &[Notification]) {
    for notification in notifications {
        let colour = match notification.kind {
            NotificationKind::Info => Colour::Blue,
            NotificationKind::Success => Colour::Green,
            NotificationKind::Warning => Colour::Yellow,
            NotificationKind::Error => Colour::Red,
        };
        eprintln!("{}", colour.paint(notification.message.as_str()));
    }
}
