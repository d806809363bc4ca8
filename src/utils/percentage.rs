use std::{fmt::Display, ops::Deref};

use serde::Serialize;

/// A share of a whole, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);

    /// `part / whole * 100`. A non-positive whole yields zero instead of dividing.
    pub fn of(part: f64, whole: f64) -> Percentage {
        if whole <= 0. || part <= 0. {
            return Percentage::ZERO;
        }
        Percentage((part / whole * 100.).min(100.))
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
