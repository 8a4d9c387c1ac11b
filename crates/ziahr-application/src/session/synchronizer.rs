//! Keeps the active session, the shown thread, the local store and the
//! `chat=<id>` deep link consistent.
//!
//! The synchronizer is the only writer of the active-session pointer and of
//! the thread. Every store mutation is a whole-list read, modify, write.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::Instrument;
use ziahr_core::api::HrApi;
use ziahr_core::config::ClientConfig;
use ziahr_core::error::{Result, ZiahrError};
use ziahr_core::notification::{Notification, Notifier};
use ziahr_core::session::{
    derive_title, group_sessions, session_id_at, ChatLocation, ChatSession, Message,
    SessionContext, SessionGroup, SessionStore, SessionTicket, SessionTrigger, ThreadState,
    DEFAULT_TITLE,
};
use ziahr_core::storage::{KeyValueStore, JUST_EMPTIED_KEY};
use ziahr_infrastructure::SettingsRepository;

/// What `load_session` put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The session has no messages; the welcome screen is shown.
    Welcome { session_id: String },
    /// The newest page is shown.
    Loaded {
        session_id: String,
        total: usize,
        has_more: bool,
        /// Title to highlight in the sidebar when opened from search.
        highlight: Option<String>,
    },
}

impl LoadOutcome {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Welcome { session_id } | Self::Loaded { session_id, .. } => session_id,
        }
    }
}

/// Result of one backward page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFetch {
    /// A page was prepended to the thread.
    Fetched {
        page: u32,
        added: usize,
        has_more: bool,
    },
    /// A fetch for the same session is already in flight.
    Skipped,
    /// The session changed while the page was in flight; it was dropped.
    Stale,
    /// No active session, or every page was already fetched.
    Exhausted,
    /// The request failed; `has_more` and the thread are unchanged.
    Failed,
}

/// Result of the page-load sequence.
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    /// Session restored from the deep link, if any.
    pub restored: Option<LoadOutcome>,
    /// Sidebar groups after pruning.
    pub groups: Vec<SessionGroup>,
    /// The previous run deleted the last chat; deep links were ignored.
    pub just_emptied: bool,
}

pub struct SessionSynchronizer {
    store: Arc<dyn SessionStore>,
    api: Arc<dyn HrApi>,
    location: Arc<dyn ChatLocation>,
    notifier: Arc<dyn Notifier>,
    storage: Arc<dyn KeyValueStore>,
    settings: SettingsRepository,
    context: SessionContext,
    thread: Mutex<ThreadState>,
    /// Session whose page fetch is in flight.
    fetching: std::sync::Mutex<Option<String>>,
    page_size: usize,
    title_max_chars: usize,
}

impl SessionSynchronizer {
    pub fn new(
        store: Arc<dyn SessionStore>,
        api: Arc<dyn HrApi>,
        location: Arc<dyn ChatLocation>,
        notifier: Arc<dyn Notifier>,
        storage: Arc<dyn KeyValueStore>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            store,
            api,
            location,
            notifier,
            settings: SettingsRepository::new(storage.clone()),
            storage,
            context: SessionContext::new(),
            thread: Mutex::new(ThreadState::new()),
            fetching: std::sync::Mutex::new(None),
            page_size: config.page_size.max(1),
            title_max_chars: config.title_max_chars,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }

    pub fn active_session(&self) -> Option<String> {
        self.context.active()
    }

    /// Copy of the shown thread.
    pub async fn thread_snapshot(&self) -> ThreadState {
        self.thread.lock().await.clone()
    }

    /// Sessions of the store, newest first.
    pub async fn sessions(&self) -> Result<Vec<ChatSession>> {
        self.store.load().await
    }

    /// Decides which session a user action applies to.
    ///
    /// Returns `None` only for `ExplicitNewChat`: a new chat has no id until
    /// its first message is sent.
    pub async fn resolve_active_session(
        &self,
        trigger: SessionTrigger,
    ) -> Result<Option<SessionTicket>> {
        match &trigger {
            SessionTrigger::LoadById(session_id) => Ok(Some(self.activate(session_id).await)),
            SessionTrigger::ExplicitNewChat => {
                self.deactivate().await;
                tracing::debug!("[SessionSynchronizer] New chat requested, pointer cleared");
                Ok(None)
            }
            SessionTrigger::SendMessage | SessionTrigger::ClickSuggestion => {
                if let Some(ticket) = self.context.ticket() {
                    self.thread.lock().await.bind(&ticket.session_id);
                    self.location.replace_chat_param(Some(&ticket.session_id));
                    return Ok(Some(ticket));
                }

                // Placeholders must be gone before a new id is persisted.
                let existing = self.prune_store().await?;
                let session_id = mint_session_id(Utc::now(), &existing);
                tracing::info!(
                    "[SessionSynchronizer] Created session {} ({:?})",
                    session_id,
                    trigger
                );
                Ok(Some(self.activate(&session_id).await))
            }
        }
    }

    /// Shows a stored session: count first, then the newest page.
    pub async fn load_session(&self, session_id: &str, from_search: bool) -> Result<LoadOutcome> {
        let span = tracing::debug_span!("load_session", session_id = %session_id, from_search);
        self.load_session_inner(session_id, from_search)
            .instrument(span)
            .await
    }

    async fn load_session_inner(&self, session_id: &str, from_search: bool) -> Result<LoadOutcome> {
        let switching = {
            let thread = self.thread.lock().await;
            !thread.is_empty() && thread.session_id() != Some(session_id)
        };
        if switching {
            self.save_session(false).await?;
        }

        let ticket = self.context.set_active(session_id);
        self.thread.lock().await.reset(Some(session_id.to_string()));
        self.location.replace_chat_param(Some(session_id));

        let stored = self.store.find_by_id(session_id).await?;
        let total = match self.api.chat_count(session_id).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!(
                    "[SessionSynchronizer] Count of {} unavailable, using stored count: {}",
                    session_id,
                    e
                );
                stored.as_ref().map_or(0, |s| s.message_count)
            }
        };

        if ticket.is_stale() {
            return Err(ZiahrError::cancelled(format!(
                "Session {} was replaced while loading",
                session_id
            )));
        }

        if total == 0 {
            tracing::debug!("[SessionSynchronizer] {} is empty, showing welcome", session_id);
            return Ok(LoadOutcome::Welcome {
                session_id: session_id.to_string(),
            });
        }

        {
            let mut thread = self.thread.lock().await;
            thread.set_known_total(total);
            thread.start_pagination(total, self.page_size);
        }

        if self.guarded_fetch(Some(total)).await == PageFetch::Stale {
            return Err(ZiahrError::cancelled(format!(
                "Session {} was replaced while loading",
                session_id
            )));
        }

        let thread = self.thread.lock().await;
        let highlight = from_search.then(|| {
            stored
                .map(|s| s.title)
                .unwrap_or_else(|| DEFAULT_TITLE.to_string())
        });

        Ok(LoadOutcome::Loaded {
            session_id: session_id.to_string(),
            total: thread.known_total(),
            has_more: thread.has_more(),
            highlight,
        })
    }

    /// Fetches the next older page of the active session and prepends it.
    pub async fn load_older_page(&self) -> PageFetch {
        self.guarded_fetch(None).await
    }

    /// `server_total` is a count taken by the caller for this fetch; without
    /// one the server is asked again.
    async fn guarded_fetch(&self, server_total: Option<usize>) -> PageFetch {
        let Some(ticket) = self.context.ticket() else {
            return PageFetch::Exhausted;
        };

        let Some(_guard) = FetchGuard::acquire(&self.fetching, &ticket.session_id) else {
            tracing::debug!(
                "[SessionSynchronizer] Page fetch for {} already in flight",
                ticket.session_id
            );
            return PageFetch::Skipped;
        };

        self.fetch_page(&ticket, server_total).await
    }

    async fn fetch_page(&self, ticket: &SessionTicket, server_total: Option<usize>) -> PageFetch {
        let session_id = ticket.session_id.as_str();
        let (last_total, page_size) = {
            let thread = self.thread.lock().await;
            if thread.session_id() != Some(session_id) {
                return PageFetch::Stale;
            }
            match thread.cursor() {
                Some(cursor) if cursor.has_more => (cursor.server_total, cursor.page_size),
                _ => return PageFetch::Exhausted,
            }
        };

        // Pages are cut from the newest row, so the count has to be current.
        let total = match server_total {
            Some(total) => total,
            None => {
                let counted = tokio::select! {
                    biased;
                    _ = ticket.stale() => return PageFetch::Stale,
                    counted = self.api.chat_count(session_id) => counted,
                };
                match counted {
                    Ok(total) => total,
                    Err(e) => {
                        tracing::warn!(
                            "[SessionSynchronizer] Count of {} unavailable, paging from {}: {}",
                            session_id,
                            last_total,
                            e
                        );
                        last_total
                    }
                }
            }
        };

        let page = {
            let thread = self.thread.lock().await;
            match thread.cursor() {
                Some(cursor) if thread.session_id() == Some(session_id) => cursor.page_for(total),
                _ => return PageFetch::Stale,
            }
        };

        let result = tokio::select! {
            biased;
            _ = ticket.stale() => {
                tracing::debug!("[SessionSynchronizer] Dropping page {} of {}", page, session_id);
                return PageFetch::Stale;
            }
            result = self.api.chat_page(session_id, page, page_size) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    "[SessionSynchronizer] Failed to fetch page {} of {}: {}",
                    page,
                    session_id,
                    e
                );
                self.notifier
                    .notify(Notification::error("Failed to load older messages"));
                return PageFetch::Failed;
            }
        };

        let mut thread = self.thread.lock().await;
        if ticket.is_stale() || thread.session_id() != Some(session_id) {
            return PageFetch::Stale;
        }

        let rows = response.messages.len();
        let older = match thread.cursor_mut() {
            Some(cursor) => cursor.take_older(page, total, response.messages),
            None => return PageFetch::Stale,
        };
        let added = thread.prepend_page(older);
        if total > thread.known_total() {
            thread.set_known_total(total);
        }

        tracing::debug!(
            "[SessionSynchronizer] Page {} of {}: {} rows, {} new, has_more={}",
            page,
            session_id,
            rows,
            added,
            thread.has_more()
        );

        PageFetch::Fetched {
            page,
            added,
            has_more: thread.has_more(),
        }
    }

    /// Upserts the summary of the active session.
    ///
    /// Returns the saved summary, or `None` when there is nothing to save
    /// (no active session, or its thread is empty).
    pub async fn save_session(&self, update_timestamp: bool) -> Result<Option<ChatSession>> {
        let Some(session_id) = self.context.active() else {
            return Ok(None);
        };

        let (first_user, known_total) = {
            let thread = self.thread.lock().await;
            if thread.session_id() != Some(session_id.as_str()) || thread.is_empty() {
                return Ok(None);
            }
            (
                thread.first_user_message().map(|m| m.content.clone()),
                thread.known_total(),
            )
        };

        let mut sessions = self.store.load().await?;
        let position = sessions.iter().position(|s| s.id == session_id);
        let prior = position.map(|i| sessions[i].clone());

        let title = match &prior {
            Some(prior) if prior.has_custom_title() => prior.title.clone(),
            _ => first_user
                .map(|content| derive_title(&content, self.title_max_chars))
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        };

        let timestamp = match &prior {
            Some(prior) if !update_timestamp && !prior.timestamp.is_empty() => {
                prior.timestamp.clone()
            }
            _ => Utc::now().to_rfc3339(),
        };

        let message_count = prior
            .as_ref()
            .map_or(0, |p| p.message_count)
            .max(known_total);

        let session = ChatSession {
            id: session_id,
            title,
            timestamp,
            message_count,
        };

        match position {
            Some(i) => sessions[i] = session.clone(),
            None => sessions.push(session.clone()),
        }
        self.store.save_all(&sessions).await?;

        tracing::debug!(
            "[SessionSynchronizer] Saved {} (title={}, count={}, touched={})",
            session.id,
            session.title,
            session.message_count,
            update_timestamp
        );
        Ok(Some(session))
    }

    /// Writes the pruned list back. Returns it.
    pub async fn prune_store(&self) -> Result<Vec<ChatSession>> {
        let sessions = self.store.load().await?;
        self.store.save_all(&sessions).await?;
        Ok(sessions)
    }

    /// Appends a message to the thread of the active session.
    pub async fn append_message(&self, message: Message) -> Result<()> {
        let session_id = self
            .context
            .active()
            .ok_or_else(|| ZiahrError::invalid_input("No active session to append to"))?;

        let mut thread = self.thread.lock().await;
        thread.bind(&session_id);
        thread.append(message);
        Ok(())
    }

    /// Changes the title only; the timestamp is untouched.
    pub async fn rename_session(&self, session_id: &str, title: &str) -> Result<ChatSession> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ZiahrError::invalid_input("Title cannot be empty"));
        }

        let mut sessions = self.store.load().await?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| ZiahrError::not_found("ChatSession", session_id))?;
        session.title = title.to_string();
        let renamed = session.clone();

        self.store.save_all(&sessions).await?;
        tracing::info!("[SessionSynchronizer] Renamed {} to '{}'", session_id, title);
        Ok(renamed)
    }

    /// Moves a session from the store to `settings.archivedChats`.
    pub async fn archive_session(&self, session_id: &str) -> Result<ChatSession> {
        let mut sessions = self.store.load().await?;
        let position = sessions
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| ZiahrError::not_found("ChatSession", session_id))?;
        let archived = sessions.remove(position);

        self.settings.update(|settings| {
            if !settings.is_archived(&archived.id) {
                settings.archived_chats.push(archived.clone());
            }
        })?;
        self.store.save_all(&sessions).await?;

        if self.context.is_active(session_id) {
            self.deactivate().await;
        }

        tracing::info!("[SessionSynchronizer] Archived {}", session_id);
        Ok(archived)
    }

    /// Moves an archived summary back into the store.
    pub async fn unarchive_session(&self, session_id: &str) -> Result<ChatSession> {
        let mut settings = self.settings.load()?;
        let position = settings
            .archived_chats
            .iter()
            .position(|s| s.id == session_id)
            .ok_or_else(|| ZiahrError::not_found("ArchivedChat", session_id))?;
        let restored = settings.archived_chats.remove(position);

        let mut sessions = self.store.load().await?;
        if !sessions.iter().any(|s| s.id == restored.id) {
            sessions.push(restored.clone());
        }
        self.store.save_all(&sessions).await?;
        self.settings.save(&settings)?;

        tracing::info!("[SessionSynchronizer] Unarchived {}", session_id);
        Ok(restored)
    }

    /// Deletes a session from the store and the archive.
    ///
    /// Returns true if the store became empty, in which case the next
    /// bootstrap starts on the welcome screen regardless of the deep link.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let mut sessions = self.store.load().await?;
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        let removed_from_store = sessions.len() != before;

        let mut removed_from_archive = false;
        if self.settings.load()?.is_archived(session_id) {
            self.settings
                .update(|settings| settings.archived_chats.retain(|s| s.id != session_id))?;
            removed_from_archive = true;
        }

        let was_active = self.context.is_active(session_id);
        if !removed_from_store && !removed_from_archive && !was_active {
            return Err(ZiahrError::not_found("ChatSession", session_id));
        }

        self.store.save_all(&sessions).await?;
        if was_active {
            self.deactivate().await;
        }

        let emptied = removed_from_store && sessions.is_empty();
        if emptied {
            self.storage.set(JUST_EMPTIED_KEY, "true")?;
            self.location.replace_chat_param(None);
        }

        tracing::info!(
            "[SessionSynchronizer] Deleted {} (store emptied: {})",
            session_id,
            emptied
        );
        Ok(emptied)
    }

    /// Forgets every local session (after the server history was cleared).
    pub async fn clear_all(&self) -> Result<()> {
        self.store.save_all(&[]).await?;
        self.deactivate().await;
        self.storage.set(JUST_EMPTIED_KEY, "true")?;
        tracing::info!("[SessionSynchronizer] Cleared all sessions");
        Ok(())
    }

    /// Page-load sequence: prune, honor the just-emptied flag, follow the
    /// deep link, build the sidebar.
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome> {
        self.prune_store().await?;

        let just_emptied = self.storage.get(JUST_EMPTIED_KEY)?.is_some();
        let restored = if just_emptied {
            self.storage.remove(JUST_EMPTIED_KEY)?;
            self.deactivate().await;
            tracing::debug!("[SessionSynchronizer] Store was emptied last run, ignoring deep link");
            None
        } else if let Some(session_id) = self.location.chat_param() {
            match self.load_session(&session_id, false).await {
                Ok(outcome) => Some(outcome),
                Err(e) => {
                    tracing::warn!(
                        "[SessionSynchronizer] Could not restore {}: {}",
                        session_id,
                        e
                    );
                    self.notifier
                        .notify(Notification::error(format!("Could not open chat {}", session_id)));
                    self.deactivate().await;
                    None
                }
            }
        } else {
            None
        };

        let groups = self.sidebar(&Local::now()).await?;
        Ok(BootstrapOutcome {
            restored,
            groups,
            just_emptied,
        })
    }

    /// Sidebar groups of the store relative to `now`.
    pub async fn sidebar<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<Vec<SessionGroup>> {
        let sessions = self.store.load().await?;
        Ok(group_sessions(&sessions, now))
    }

    async fn activate(&self, session_id: &str) -> SessionTicket {
        let ticket = self.context.set_active(session_id);
        self.thread.lock().await.bind(session_id);
        self.location.replace_chat_param(Some(session_id));
        ticket
    }

    async fn deactivate(&self) {
        self.context.clear();
        self.thread.lock().await.reset(None);
        self.location.replace_chat_param(None);
    }
}

/// `chat_<now>`, moved forward a millisecond at a time past taken ids.
fn mint_session_id(now: DateTime<Utc>, existing: &[ChatSession]) -> String {
    let taken: HashSet<&str> = existing.iter().map(|s| s.id.as_str()).collect();
    let mut at = now;
    loop {
        let id = session_id_at(at);
        if !taken.contains(id.as_str()) {
            return id;
        }
        at += chrono::Duration::milliseconds(1);
    }
}

/// Marks a page fetch of one session as in flight until dropped.
struct FetchGuard<'a> {
    slot: &'a std::sync::Mutex<Option<String>>,
    session_id: String,
}

impl<'a> FetchGuard<'a> {
    fn acquire(slot: &'a std::sync::Mutex<Option<String>>, session_id: &str) -> Option<Self> {
        let mut current = match slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if current.as_deref() == Some(session_id) {
            return None;
        }
        *current = Some(session_id.to_string());
        Some(Self {
            slot,
            session_id: session_id.to_string(),
        })
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut current = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if current.as_deref() == Some(self.session_id.as_str()) {
            *current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_skips_taken_ids() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let existing = vec![
            ChatSession::new("chat_1700000000000"),
            ChatSession::new("chat_1700000000001"),
        ];

        assert_eq!(mint_session_id(now, &existing), "chat_1700000000002");
        assert_eq!(mint_session_id(now, &[]), "chat_1700000000000");
    }

    #[test]
    fn test_fetch_guard_is_per_session() {
        let slot = std::sync::Mutex::new(None);

        let first = FetchGuard::acquire(&slot, "chat_1");
        assert!(first.is_some());
        assert!(FetchGuard::acquire(&slot, "chat_1").is_none());

        // A newer session takes the slot; the old guard must not clear it.
        let second = FetchGuard::acquire(&slot, "chat_2");
        assert!(second.is_some());
        drop(first);
        assert!(FetchGuard::acquire(&slot, "chat_2").is_none());

        drop(second);
        assert!(FetchGuard::acquire(&slot, "chat_2").is_some());
    }
}
