//! Sidebar grouping of sessions by recency.

use super::model::ChatSession;
use super::prune::sort_newest_first;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use serde::Serialize;

/// Recency bucket of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DateGroup {
    Today,
    Yesterday,
    Previous7Days,
    Previous30Days,
    /// Older sessions, bucketed per calendar month.
    Month { year: i32, month: u32 },
}

impl DateGroup {
    /// Display label of the bucket.
    pub fn label(&self) -> String {
        match self {
            Self::Today => "Today".to_string(),
            Self::Yesterday => "Yesterday".to_string(),
            Self::Previous7Days => "Previous 7 Days".to_string(),
            Self::Previous30Days => "Previous 30 Days".to_string(),
            Self::Month { year, month } => format!("{} {}", month_name(*month), year),
        }
    }

    fn rank(&self) -> (u8, i64) {
        match self {
            Self::Today => (0, 0),
            Self::Yesterday => (1, 0),
            Self::Previous7Days => (2, 0),
            Self::Previous30Days => (3, 0),
            Self::Month { year, month } => (4, -(*year as i64 * 12 + *month as i64)),
        }
    }
}

/// A labelled group of sessions, newest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionGroup {
    pub group: DateGroup,
    pub label: String,
    pub sessions: Vec<ChatSession>,
}

/// Classifies a single timestamp relative to `today` (a local date).
///
/// Unreadable timestamps land in `Today` so the session stays visible.
pub fn classify<Tz: TimeZone>(timestamp: &str, today: NaiveDate, tz: &Tz) -> DateGroup {
    let date = match DateTime::parse_from_rfc3339(timestamp) {
        Ok(ts) => ts.with_timezone(tz).date_naive(),
        Err(_) => return DateGroup::Today,
    };

    if date >= today {
        DateGroup::Today
    } else if date >= today - Duration::days(1) {
        DateGroup::Yesterday
    } else if date >= today - Duration::days(7) {
        DateGroup::Previous7Days
    } else if date >= today - Duration::days(30) {
        DateGroup::Previous30Days
    } else {
        DateGroup::Month {
            year: date.year(),
            month: date.month(),
        }
    }
}

/// Buckets sessions for the sidebar.
///
/// Midnight boundaries are computed once from `now`, in `now`'s time zone.
/// Groups are ordered Today, Yesterday, Previous 7 Days, Previous 30 Days,
/// then months newest first; empty groups are omitted.
pub fn group_sessions<Tz: TimeZone>(sessions: &[ChatSession], now: &DateTime<Tz>) -> Vec<SessionGroup> {
    let tz = now.timezone();
    let today = now.date_naive();

    let mut sorted = sessions.to_vec();
    sort_newest_first(&mut sorted);

    let mut groups: Vec<SessionGroup> = Vec::new();
    for session in sorted {
        let group = classify(&session.timestamp, today, &tz);
        match groups.iter_mut().find(|g| g.group == group) {
            Some(existing) => existing.sessions.push(session),
            None => groups.push(SessionGroup {
                label: group.label(),
                group,
                sessions: vec![session],
            }),
        }
    }

    groups.sort_by_key(|g| g.group.rank());
    groups
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
