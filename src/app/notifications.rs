use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

/// How long a notification stays visible.
pub const NOTIFICATION_LIFETIME: TimeDelta = TimeDelta::seconds(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.timestamp >= NOTIFICATION_LIFETIME
    }
}

/// Short lived messages about finished actions. Time is passed in by the caller, so expiry
/// follows whatever clock the caller uses.
#[derive(Debug, Default, Clone)]
pub struct NotificationCenter {
    next_id: u64,
    items: Vec<Notification>,
}

impl NotificationCenter {
    /// Adds a notification and returns its id. Ids are unique within one center.
    pub fn push(&mut self, kind: NotificationKind, message: impl Into<String>, now: DateTime<Utc>) -> u64 {
        self.next_id += 1;
        self.items.push(Notification {
            id: self.next_id,
            message: message.into(),
            kind,
            timestamp: now,
        });
        self.next_id
    }

    /// Drops every notification older than [NOTIFICATION_LIFETIME].
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.items.retain(|v| !v.is_expired(now));
    }

    /// Notifications still visible at `now`, oldest first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Notification> {
        self.items
            .iter()
            .filter(|v| !v.is_expired(now))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
