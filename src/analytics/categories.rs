use std::fmt::Display;

use clap::ValueEnum;
use serde::Serialize;

use crate::{store::entities::UsageRecord, utils::percentage::Percentage};

/// Fixed taxonomy used for the usage breakdown. Declaration order is the report order and the
/// priority used by [CategoryMatching::FirstMatch].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Development,
    Design,
    Office,
    Browser,
    Entertainment,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Development,
        Category::Design,
        Category::Office,
        Category::Browser,
        Category::Entertainment,
        Category::Other,
    ];

    /// Keywords matched against application names. `Other` has none, it takes what's left.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Category::Development => &[
                "Visual Studio Code",
                "WebStorm",
                "IntelliJ",
                "Eclipse",
                "Atom",
                "Sublime",
            ],
            Category::Design => &[
                "Photoshop",
                "Illustrator",
                "After Effects",
                "Figma",
                "Sketch",
                "InDesign",
            ],
            Category::Office => &["Word", "Excel", "PowerPoint", "Outlook", "Teams", "Slack"],
            Category::Browser => &["Chrome", "Firefox", "Safari", "Edge", "Opera"],
            Category::Entertainment => &["Spotify", "VLC", "Netflix", "YouTube", "Discord", "Steam"],
            Category::Other => &[],
        }
    }

    /// Whether any keyword of this category occurs in `application`. Never true for `Other`.
    pub fn matches_keywords(&self, application: &str) -> bool {
        contains_any(application, self.keywords())
    }

    /// The first keyword category matching `application`, or `Other`.
    pub fn of(application: &str) -> Category {
        Category::ALL
            .into_iter()
            .find(|v| v.matches_keywords(application))
            .unwrap_or(Category::Other)
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How records whose name hits keywords of several categories are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CategoryMatching {
    /// Each category sums every record it matches, so one record can count towards several
    /// categories and the percentages can add up to more than 100.
    #[default]
    Overlapping,
    /// Each record counts once, towards the first matching category in [Category::ALL] order.
    FirstMatch,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub category: Category,
    pub hours: f64,
    pub percentage: Percentage,
}

/// Sums hours per category and drops categories without any hours. `Other` always receives
/// exactly the records matching no keyword at all.
pub fn category_breakdown(
    records: &[UsageRecord],
    total_hours: f64,
    matching: CategoryMatching,
) -> Vec<CategoryBucket> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let hours = records
                .iter()
                .filter(|record| belongs_to(category, &record.application, matching))
                .map(|record| record.total_hours)
                .sum::<f64>();
            CategoryBucket {
                category,
                hours,
                percentage: Percentage::of(hours, total_hours),
            }
        })
        .filter(|bucket| bucket.hours > 0.)
        .collect()
}

fn belongs_to(category: Category, application: &str, matching: CategoryMatching) -> bool {
    match (category, matching) {
        (Category::Other, _) => Category::of(application) == Category::Other,
        (_, CategoryMatching::Overlapping) => category.matches_keywords(application),
        (_, CategoryMatching::FirstMatch) => Category::of(application) == category,
    }
}

/// Applications counted towards the productivity score.
pub const PRODUCTIVE_KEYWORDS: [&str; 6] = [
    "Visual Studio Code",
    "WebStorm",
    "Photoshop",
    "Illustrator",
    "Word",
    "Excel",
];

pub fn is_productive(application: &str) -> bool {
    contains_any(application, &PRODUCTIVE_KEYWORDS)
}

fn contains_any(application: &str, keywords: &[&str]) -> bool {
    let application = application.to_lowercase();
    keywords
        .iter()
        .any(|keyword| application.contains(&keyword.to_lowercase()))
}
