//! Store hygiene applied on every read of the session list.

use super::model::ChatSession;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Removes duplicate and placeholder sessions from a stored list.
///
/// - Entries sharing an id collapse into one: the most recent timestamp wins,
///   ties go to the entry with more messages.
/// - Empty default sessions ("New Chat", zero messages) are dropped. Races
///   between concurrent "new chat" triggers can leave several of them behind;
///   none of them carries content, so none survives.
///
/// Relative order of the surviving entries is preserved. The function is
/// idempotent.
pub fn prune_sessions(sessions: Vec<ChatSession>) -> Vec<ChatSession> {
    let mut winners: HashMap<String, usize> = HashMap::new();
    for (index, session) in sessions.iter().enumerate() {
        match winners.get(&session.id) {
            Some(&current) if !supersedes(session, &sessions[current]) => {}
            _ => {
                winners.insert(session.id.clone(), index);
            }
        }
    }

    sessions
        .into_iter()
        .enumerate()
        .filter(|(index, session)| winners.get(&session.id) == Some(index))
        .map(|(_, session)| session)
        .filter(|session| !session.is_empty_default())
        .collect()
}

fn supersedes(candidate: &ChatSession, current: &ChatSession) -> bool {
    let candidate_ts = sort_key(candidate);
    let current_ts = sort_key(current);
    candidate_ts > current_ts
        || (candidate_ts == current_ts && candidate.message_count > current.message_count)
}

fn sort_key(session: &ChatSession) -> DateTime<Utc> {
    session.parsed_timestamp().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Sorts sessions newest first. Entries with unreadable timestamps are
/// treated as brand new so they stay visible at the top.
pub fn sort_newest_first(sessions: &mut [ChatSession]) {
    sessions.sort_by(|a, b| {
        let a_ts = a.parsed_timestamp().unwrap_or(DateTime::<Utc>::MAX_UTC);
        let b_ts = b.parsed_timestamp().unwrap_or(DateTime::<Utc>::MAX_UTC);
        b_ts.cmp(&a_ts)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::DEFAULT_TITLE;

    fn session(id: &str, title: &str, timestamp: &str, count: usize) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            title: title.to_string(),
            timestamp: timestamp.to_string(),
            message_count: count,
        }
    }

    fn sample() -> Vec<ChatSession> {
        vec![
            session("chat_1", DEFAULT_TITLE, "2026-01-01T10:00:00Z", 0),
            session("chat_2", "Payroll dates", "2026-01-02T10:00:00Z", 4),
            session("chat_3", DEFAULT_TITLE, "2026-01-03T10:00:00Z", 0),
            session("chat_2", "Payroll dates", "2026-01-04T10:00:00Z", 6),
            session("chat_4", DEFAULT_TITLE, "2026-01-05T10:00:00Z", 2),
            session("chat_5", "Renamed but empty", "2026-01-06T10:00:00Z", 0),
        ]
    }

    #[test]
    fn test_prune_removes_empty_defaults() {
        let pruned = prune_sessions(sample());
        assert!(pruned.iter().all(|s| !s.is_empty_default()));
        let ids: Vec<&str> = pruned.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["chat_2", "chat_4", "chat_5"]);
    }

    #[test]
    fn test_prune_keeps_most_recent_duplicate() {
        let pruned = prune_sessions(sample());
        let payroll: Vec<&ChatSession> = pruned.iter().filter(|s| s.id == "chat_2").collect();
        assert_eq!(payroll.len(), 1);
        assert_eq!(payroll[0].message_count, 6);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let once = prune_sessions(sample());
        let twice = prune_sessions(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prune_empty_list() {
        assert!(prune_sessions(Vec::new()).is_empty());
    }

    #[test]
    fn test_sort_newest_first() {
        let mut sessions = vec![
            session("a", "A", "2026-01-01T10:00:00Z", 1),
            session("b", "B", "not a date", 1),
            session("c", "C", "2026-02-01T10:00:00Z", 1),
        ];
        sort_newest_first(&mut sessions);
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }
}
