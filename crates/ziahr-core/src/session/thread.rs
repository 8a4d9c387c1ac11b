//! In-memory message log of the rendered thread.
//!
//! The thread is the state of record for what is on screen. Rendering is a
//! projection of `messages`; nothing is ever read back from the view.

use super::message::{Message, MessageType};

/// Backward pagination cursor for one session.
///
/// Positions count rows of the server-side history from the oldest (0).
/// Pages count from the newest row, so the page holding the next older rows
/// moves whenever the conversation grows. The cursor recomputes it from the
/// current server total on every fetch and trims rows already shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub page_size: usize,
    /// Server total when the last page was cut.
    pub server_total: usize,
    /// Position of the oldest row shown.
    pub oldest_shown: usize,
    /// False once the oldest row is shown or a page came back short.
    pub has_more: bool,
}

impl PageCursor {
    pub fn new(server_total: usize, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            server_total,
            oldest_shown: server_total,
            has_more: server_total > 0,
        }
    }

    /// Page (1 = newest) that holds the row just older than `oldest_shown`
    /// in a history of `server_total` rows.
    pub fn page_for(&self, server_total: usize) -> u32 {
        let newer = server_total.saturating_sub(self.oldest_shown);
        (newer / self.page_size) as u32 + 1
    }

    /// Keeps the rows of `page` that are older than everything shown and
    /// moves the cursor past them. `rows` is the page in chronological order.
    pub fn take_older(&mut self, page: u32, server_total: usize, mut rows: Vec<Message>) -> Vec<Message> {
        let full = rows.len() >= self.page_size;
        let newer_pages = page.saturating_sub(1) as usize * self.page_size;
        let page_end = server_total.saturating_sub(newer_pages);
        let page_start = page_end.saturating_sub(rows.len());

        let keep = self.oldest_shown.saturating_sub(page_start).min(rows.len());
        rows.truncate(keep);

        self.server_total = server_total;
        if keep > 0 {
            self.oldest_shown = page_start;
        }
        self.has_more = keep > 0 && full && page_start > 0;
        rows
    }
}

/// Messages of the session currently shown.
#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    session_id: Option<String>,
    messages: Vec<Message>,
    /// Messages known to exist for the session (server count + appended).
    known_total: usize,
    cursor: Option<PageCursor>,
}

impl ThreadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the thread and binds it to `session_id`.
    pub fn reset(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
        self.messages.clear();
        self.known_total = 0;
        self.cursor = None;
    }

    /// Binds an empty thread to a session without clearing anything else.
    ///
    /// Used when a fresh session id is minted for messages that are about to
    /// be appended.
    pub fn bind(&mut self, session_id: &str) {
        if self.session_id.as_deref() != Some(session_id) {
            self.reset(Some(session_id.to_string()));
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn known_total(&self) -> usize {
        self.known_total.max(self.messages.len())
    }

    pub fn set_known_total(&mut self, total: usize) {
        self.known_total = total;
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn cursor_mut(&mut self) -> Option<&mut PageCursor> {
        self.cursor.as_mut()
    }

    pub fn start_pagination(&mut self, server_total: usize, page_size: usize) {
        self.cursor = Some(PageCursor::new(server_total, page_size));
    }

    pub fn has_more(&self) -> bool {
        self.cursor.as_ref().is_some_and(|c| c.has_more)
    }

    /// Appends a new message at the end of the thread.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
        self.known_total += 1;
    }

    /// Prepends an older page. The page itself is in chronological order.
    ///
    /// Messages whose id is already present are skipped. Rows without a
    /// server id get a fresh one on every fetch, so overlap between pages is
    /// removed by `PageCursor::take_older` before this point.
    pub fn prepend_page(&mut self, page: Vec<Message>) -> usize {
        let fresh: Vec<Message> = page
            .into_iter()
            .filter(|m| !self.messages.iter().any(|existing| existing.id == m.id))
            .collect();
        let added = fresh.len();
        self.messages.splice(0..0, fresh);
        added
    }

    /// First message typed by the user, if loaded.
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.message_type == MessageType::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(prefix: &str, count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| {
                let mut message = Message::bot(format!("{} {}", prefix, i));
                message.id = format!("{}-{}", prefix, i);
                message
            })
            .collect()
    }

    #[test]
    fn test_cursor_walks_45_rows_in_three_pages() {
        let mut cursor = PageCursor::new(45, 20);

        assert_eq!(cursor.page_for(45), 1);
        assert_eq!(cursor.take_older(1, 45, page("p1", 20)).len(), 20);
        assert!(cursor.has_more);

        assert_eq!(cursor.page_for(45), 2);
        assert_eq!(cursor.take_older(2, 45, page("p2", 20)).len(), 20);

        assert_eq!(cursor.page_for(45), 3);
        assert_eq!(cursor.take_older(3, 45, page("p3", 5)).len(), 5);
        assert!(!cursor.has_more);
        assert_eq!(cursor.oldest_shown, 0);
    }

    #[test]
    fn test_cursor_trims_rows_shifted_by_new_messages() {
        let mut cursor = PageCursor::new(45, 20);
        cursor.take_older(1, 45, page("p1", 20));

        // Two messages were added on the server: page 2 now ends two rows
        // later, and its newest two rows are already shown.
        assert_eq!(cursor.page_for(47), 2);
        let kept = cursor.take_older(2, 47, page("p2", 20));
        let ids: Vec<&str> = kept.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), 18);
        assert_eq!(ids[0], "p2-0");
        assert_eq!(ids[17], "p2-17");
        assert_eq!(cursor.oldest_shown, 7);
        assert!(cursor.has_more);

        assert_eq!(cursor.page_for(47), 3);
        assert_eq!(cursor.take_older(3, 47, page("p3", 7)).len(), 7);
        assert!(!cursor.has_more);
    }

    #[test]
    fn test_cursor_of_empty_history_has_nothing_more() {
        assert!(!PageCursor::new(0, 20).has_more);
    }

    #[test]
    fn test_prepend_keeps_older_pages_first() {
        let mut thread = ThreadState::new();
        thread.reset(Some("chat_1".to_string()));
        thread.prepend_page(page("newest", 2));
        thread.prepend_page(page("older", 2));

        let ids: Vec<&str> = thread.messages().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["older-0", "older-1", "newest-0", "newest-1"]);
    }

    #[test]
    fn test_prepend_skips_known_ids() {
        let mut thread = ThreadState::new();
        thread.prepend_page(page("p", 3));
        let added = thread.prepend_page(page("p", 3));

        assert_eq!(added, 0);
        assert_eq!(thread.len(), 3);
    }

    #[test]
    fn test_append_tracks_total() {
        let mut thread = ThreadState::new();
        thread.set_known_total(40);
        thread.append(Message::user("hi"));
        assert_eq!(thread.known_total(), 41);
    }

    #[test]
    fn test_bind_keeps_messages_of_same_session() {
        let mut thread = ThreadState::new();
        thread.bind("chat_1");
        thread.append(Message::user("hello"));
        thread.bind("chat_1");
        assert_eq!(thread.len(), 1);

        thread.bind("chat_2");
        assert!(thread.is_empty());
    }
}
