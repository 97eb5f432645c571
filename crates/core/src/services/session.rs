//! Per-client navigation state.
//!
//! Every authenticated client owns a [`NavigationSession`]: the active view,
//! the course it is browsing, the folder trail, the last listing and its
//! history stack. Sessions live in a [`SessionStore`] behind a per-session
//! mutex, so two requests from the same client never interleave.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use coursedesk_common::{AppError, AppResult, SessionConfig};
use coursedesk_db::entities::content_item::{self, Section};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use super::content_tree::{filter_by_title, sort_siblings};

/// A top-level dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum View {
    Home,
    Section(Section),
    Profile,
    Students,
}

impl View {
    /// Parse a view name. Section views use their tab names.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "home" => Some(Self::Home),
            "profile" => Some(Self::Profile),
            "students" => Some(Self::Students),
            other => Section::from_tab_name(other).map(Self::Section),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Section(section) => section.as_str(),
            Self::Profile => "profile",
            Self::Students => "students",
        }
    }

    /// The section shown by this view, if it is a section view.
    #[must_use]
    pub const fn section(self) -> Option<Section> {
        match self {
            Self::Section(section) => Some(section),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for View {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown view: {value}"))
    }
}

impl From<View> for String {
    fn from(view: View) -> Self {
        view.as_str().to_string()
    }
}

/// One step in a session's navigation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HistoryEntry {
    /// A view was activated.
    Tab { view: View },
    /// A folder (or the section root) was opened inside a section.
    #[serde(rename_all = "camelCase")]
    Folder {
        section: Section,
        folder_id: Option<String>,
        title: Option<String>,
    },
}

/// Bounded history stack with a cursor, browser style.
///
/// `position` counts the entries at or behind the cursor; position zero is
/// the state before the first entry, which replays as Home.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    position: usize,
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            position: 0,
            limit: limit.max(1),
        }
    }

    /// Push an entry at the cursor, discarding any forward entries.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.position);
        self.entries.push_back(entry);
        if self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.position = self.entries.len();
    }

    /// Move the cursor back one entry. Returns `false` at the start.
    pub fn back(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }

    /// Move the cursor forward one entry. Returns `false` at the end.
    pub fn forward(&mut self) -> bool {
        if self.position >= self.entries.len() {
            return false;
        }
        self.position += 1;
        true
    }

    /// The entry under the cursor, `None` before the first entry.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.position
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
    }

    #[must_use]
    pub const fn can_go_back(&self) -> bool {
        self.position > 0
    }

    #[must_use]
    pub fn can_go_forward(&self) -> bool {
        self.position < self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The course a session is browsing and the viewer's sub-group within it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContext {
    pub course_id: String,
    pub sub_group: Option<String>,
}

/// One folder in the breadcrumb trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: String,
    pub title: Option<String>,
}

/// Serializable view of a session, returned by navigation endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub view: View,
    pub course: Option<CourseContext>,
    pub current_folder_id: Option<String>,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub items: Vec<content_item::Model>,
    pub filter: Option<String>,
    pub can_go_back: bool,
    pub can_go_forward: bool,
}

/// Navigation state of one client.
#[derive(Debug, Clone)]
pub struct NavigationSession {
    view: View,
    course: Option<CourseContext>,
    current_folder: Option<String>,
    trail: Vec<Breadcrumb>,
    listing: Option<Vec<content_item::Model>>,
    filter: Option<String>,
    history: History,
}

impl NavigationSession {
    #[must_use]
    pub fn new(history_limit: usize) -> Self {
        Self {
            view: View::Home,
            course: None,
            current_folder: None,
            trail: Vec::new(),
            listing: None,
            filter: None,
            history: History::new(history_limit),
        }
    }

    /// Start browsing a course. Everything else is reset to Home.
    pub fn enter_course(&mut self, context: CourseContext) {
        *self = Self::new(self.history.limit);
        self.course = Some(context);
    }

    #[must_use]
    pub const fn view(&self) -> View {
        self.view
    }

    /// Make `view` active with the folder scope back at the root.
    pub fn set_view(&mut self, view: View) {
        self.view = view;
        self.current_folder = None;
        self.trail.clear();
        self.listing = None;
        self.filter = None;
    }

    #[must_use]
    pub const fn course(&self) -> Option<&CourseContext> {
        self.course.as_ref()
    }

    /// The course context, or `BadRequest` when none was entered.
    pub fn require_course(&self) -> AppResult<&CourseContext> {
        self.course
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("No course selected".to_string()))
    }

    /// The section being browsed, or `BadRequest` outside section views.
    pub fn require_section(&self) -> AppResult<Section> {
        self.view
            .section()
            .ok_or_else(|| AppError::BadRequest(format!("View {} has no content", self.view)))
    }

    #[must_use]
    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    #[must_use]
    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        &self.trail
    }

    /// Move the folder pointer and update the breadcrumb trail.
    ///
    /// Replaying the same call against the same trail leaves both unchanged.
    pub fn navigate_to(
        &mut self,
        folder_id: Option<&str>,
        breadcrumb_index: Option<usize>,
        title: Option<&str>,
    ) {
        let Some(id) = folder_id else {
            self.current_folder = None;
            self.trail.clear();
            return;
        };

        self.current_folder = Some(id.to_string());

        // A crumb index only counts when it points at the folder being opened
        let existing = breadcrumb_index
            .filter(|&index| self.trail.get(index).is_some_and(|b| b.id == id))
            .or_else(|| self.trail.iter().position(|b| b.id == id));

        if let Some(existing) = existing {
            self.trail.truncate(existing + 1);
            if let (Some(crumb), Some(title)) = (self.trail.get_mut(existing), title) {
                if crumb.title.is_none() {
                    crumb.title = Some(title.to_string());
                }
            }
        } else if let Some(title) = title {
            self.trail.push(Breadcrumb {
                id: id.to_string(),
                title: Some(title.to_string()),
            });
        }
    }

    /// The last listing, if the current view has one.
    #[must_use]
    pub fn listing(&self) -> Option<&[content_item::Model]> {
        self.listing.as_deref()
    }

    /// Replace the listing. Any active text filter is cleared.
    pub fn set_listing(&mut self, items: Vec<content_item::Model>) {
        self.listing = Some(items);
        self.filter = None;
    }

    #[must_use]
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    /// Set the title filter. An empty term clears it.
    pub fn set_filter(&mut self, term: &str) {
        self.filter = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
    }

    /// Items as currently displayed: the listing narrowed by the filter.
    #[must_use]
    pub fn displayed_items(&self) -> Vec<content_item::Model> {
        let listing = self.listing.as_deref().unwrap_or_default();
        match self.filter.as_deref() {
            Some(term) => filter_by_title(listing, term),
            None => listing.to_vec(),
        }
    }

    /// Write new sibling orders into the listing and re-sort it.
    pub fn apply_order(&mut self, orders: &[(String, i32)]) {
        let Some(listing) = self.listing.as_mut() else {
            return;
        };
        let by_id: HashMap<&str, i32> = orders.iter().map(|(id, o)| (id.as_str(), *o)).collect();
        for item in listing.iter_mut() {
            if let Some(order) = by_id.get(item.id.as_str()) {
                item.order = Some(*order);
            }
        }
        sort_siblings(listing);
    }

    #[must_use]
    pub const fn history(&self) -> &History {
        &self.history
    }

    pub const fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            view: self.view,
            course: self.course.clone(),
            current_folder_id: self.current_folder.clone(),
            breadcrumbs: self.trail.clone(),
            items: self.displayed_items(),
            filter: self.filter.clone(),
            can_go_back: self.history.can_go_back(),
            can_go_forward: self.history.can_go_forward(),
        }
    }
}

/// Identifies one client: the signed-in user plus an optional client id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub client_id: Option<String>,
}

impl SessionKey {
    #[must_use]
    pub fn new(user_id: impl Into<String>, client_id: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            client_id,
        }
    }
}

struct StoredSession {
    session: Arc<Mutex<NavigationSession>>,
    last_seen: Instant,
}

/// In-memory registry of navigation sessions.
///
/// Each user holds at most `max_per_user` sessions; opening one more evicts
/// that user's least recently used session. Idle sessions are dropped by
/// [`SessionStore::cleanup`].
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionKey, StoredSession>>>,
    history_limit: usize,
    max_per_user: usize,
}

impl SessionStore {
    #[must_use]
    pub fn new(history_limit: usize, max_per_user: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            history_limit,
            max_per_user: max_per_user.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.history_limit, config.max_per_user)
    }

    /// Fetch the session for `key`, creating a fresh one on first use.
    pub async fn get_or_create(&self, key: &SessionKey) -> Arc<Mutex<NavigationSession>> {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(stored) = sessions.get_mut(key) {
            stored.last_seen = now;
            return Arc::clone(&stored.session);
        }

        let owned = sessions
            .keys()
            .filter(|k| k.user_id == key.user_id)
            .count();
        if owned >= self.max_per_user
            && let Some(oldest) = sessions
                .iter()
                .filter(|(k, _)| k.user_id == key.user_id)
                .min_by_key(|(_, stored)| stored.last_seen)
                .map(|(k, _)| k.clone())
        {
            tracing::debug!(user_id = %key.user_id, "Evicting least recently used session");
            sessions.remove(&oldest);
        }

        let session = Arc::new(Mutex::new(NavigationSession::new(self.history_limit)));
        sessions.insert(
            key.clone(),
            StoredSession {
                session: Arc::clone(&session),
                last_seen: now,
            },
        );
        session
    }

    /// Drop every session of a user.
    pub async fn remove_user(&self, user_id: &str) {
        self.sessions
            .write()
            .await
            .retain(|key, _| key.user_id != user_id);
    }

    /// Drop sessions unused for longer than `idle`. Sessions a request is
    /// still holding are kept. Returns the number removed.
    pub async fn cleanup(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| {
            stored.last_seen.elapsed() < idle || Arc::strong_count(&stored.session) > 1
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use coursedesk_db::entities::content_item::ContentKind;
    use coursedesk_db::test_utils::fixtures;

    fn session_in_course() -> NavigationSession {
        let mut session = NavigationSession::new(10);
        session.enter_course(CourseContext {
            course_id: "course1".to_string(),
            sub_group: Some("10A".to_string()),
        });
        session
    }

    #[test]
    fn test_view_parse_and_serde() {
        assert_eq!(View::parse("home"), Some(View::Home));
        assert_eq!(View::parse("papers"), Some(View::Section(Section::PastPapers)));
        assert_eq!(View::parse("settings"), None);

        let json = serde_json::to_string(&View::Section(Section::Homework)).unwrap();
        assert_eq!(json, "\"homework\"");
        let view: View = serde_json::from_str("\"students\"").unwrap();
        assert_eq!(view, View::Students);
        assert!(serde_json::from_str::<View>("\"nope\"").is_err());
    }

    #[test]
    fn test_navigate_to_pushes_only_with_title() {
        let mut session = session_in_course();

        session.navigate_to(Some("f1"), None, None);
        assert_eq!(session.current_folder(), Some("f1"));
        assert!(session.breadcrumbs().is_empty());

        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        let ids: Vec<_> = session.breadcrumbs().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["f1", "f2"]);
    }

    #[test]
    fn test_navigate_to_existing_truncates_and_fills_title() {
        let mut session = session_in_course();
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        session.navigate_to(Some("f3"), None, Some("Sheet"));

        session.navigate_to(Some("f2"), None, None);
        assert_eq!(session.breadcrumbs().len(), 2);
        assert_eq!(session.current_folder(), Some("f2"));

        // A crumb recorded without a title picks one up later
        session.trail[1].title = None;
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        assert_eq!(session.breadcrumbs()[1].title.as_deref(), Some("Lesson 2"));
    }

    #[test]
    fn test_navigate_to_breadcrumb_index_and_root() {
        let mut session = session_in_course();
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        session.navigate_to(Some("f3"), None, Some("Sheet"));

        session.navigate_to(Some("f1"), Some(0), None);
        assert_eq!(session.breadcrumbs().len(), 1);
        assert_eq!(session.current_folder(), Some("f1"));

        session.navigate_to(None, None, None);
        assert!(session.breadcrumbs().is_empty());
        assert_eq!(session.current_folder(), None);
    }

    #[test]
    fn test_navigate_to_is_idempotent() {
        let mut session = session_in_course();
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        let trail = session.breadcrumbs().to_vec();

        session.navigate_to(Some("f2"), None, Some("Lesson 2"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));

        assert_eq!(session.breadcrumbs(), trail.as_slice());
        assert_eq!(session.current_folder(), Some("f2"));
    }

    #[test]
    fn test_history_push_discards_forward_entries() {
        let mut history = History::new(10);
        let tab = |view| HistoryEntry::Tab { view };

        history.push(tab(View::Section(Section::Content)));
        history.push(tab(View::Section(Section::Homework)));
        history.push(tab(View::Profile));
        assert!(history.back());
        assert!(history.back());
        assert_eq!(
            history.current(),
            Some(&tab(View::Section(Section::Content)))
        );

        history.push(tab(View::Students));
        assert_eq!(history.len(), 2);
        assert!(!history.can_go_forward());

        assert!(history.back());
        assert!(history.back());
        assert_eq!(history.current(), None);
        assert!(!history.back());
        assert!(history.forward());
        assert_eq!(
            history.current(),
            Some(&tab(View::Section(Section::Content)))
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = History::new(2);
        for view in [View::Home, View::Profile, View::Students] {
            history.push(HistoryEntry::Tab { view });
        }

        assert_eq!(history.len(), 2);
        assert_eq!(
            history.current(),
            Some(&HistoryEntry::Tab {
                view: View::Students
            })
        );
    }

    #[test]
    fn test_filter_and_listing_reset() {
        let mut session = session_in_course();
        let mut a = fixtures::item("a", ContentKind::Video, 0);
        a.title = "Derivatives Intro".to_string();
        let mut b = fixtures::item("b", ContentKind::Video, 1);
        b.title = "Integrals".to_string();
        session.set_listing(vec![a, b]);

        session.set_filter("deriv");
        assert!(session.is_filtered());
        assert_eq!(session.displayed_items().len(), 1);

        session.set_filter("");
        assert!(!session.is_filtered());
        assert_eq!(session.displayed_items().len(), 2);

        session.set_filter("int");
        session.set_listing(Vec::new());
        assert!(!session.is_filtered());
    }

    #[test]
    fn test_apply_order_resequences_listing() {
        let mut session = session_in_course();
        session.set_listing(vec![
            fixtures::item("a", ContentKind::File, 0),
            fixtures::item("b", ContentKind::File, 1),
            fixtures::item("c", ContentKind::File, 2),
        ]);

        session.apply_order(&[
            ("c".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
        ]);

        let ids: Vec<_> = session
            .listing()
            .unwrap()
            .iter()
            .map(|i| (i.id.as_str(), i.order))
            .collect();
        assert_eq!(ids, [("c", Some(1)), ("a", Some(2)), ("b", Some(3))]);
    }

    #[test]
    fn test_enter_course_resets_state() {
        let mut session = session_in_course();
        session.set_view(View::Section(Section::Content));
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.history_mut().push(HistoryEntry::Tab { view: View::Profile });

        session.enter_course(CourseContext {
            course_id: "course2".to_string(),
            sub_group: None,
        });

        assert_eq!(session.view(), View::Home);
        assert!(session.breadcrumbs().is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.require_course().unwrap().course_id, "course2");
        assert!(session.require_section().is_err());
    }

    #[tokio::test]
    async fn test_store_keys_sessions_by_user_and_client() {
        let store = SessionStore::new(10, 4);
        let tab1 = SessionKey::new("u1", Some("tab1".to_string()));
        let tab2 = SessionKey::new("u1", Some("tab2".to_string()));

        let first = store.get_or_create(&tab1).await;
        let again = store.get_or_create(&tab1).await;
        let other = store.get_or_create(&tab2).await;

        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(store.len().await, 2);

        store.remove_user("u1").await;
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_navigate_to_ignores_out_of_range_breadcrumb_index() {
        let mut session = session_in_course();
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));

        session.navigate_to(Some("f1"), Some(usize::MAX), None);
        assert_eq!(session.current_folder(), Some("f1"));
        let ids: Vec<_> = session.breadcrumbs().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["f1"]);
    }

    #[test]
    fn test_navigate_to_mismatched_breadcrumb_index_keeps_trail_in_step() {
        let mut session = session_in_course();
        session.navigate_to(Some("f1"), None, Some("Unit 1"));
        session.navigate_to(Some("f2"), None, Some("Lesson 2"));

        session.navigate_to(Some("f2"), Some(0), None);
        assert_eq!(session.current_folder(), Some("f2"));
        assert_eq!(session.breadcrumbs().len(), 2);
        assert_eq!(
            session.breadcrumbs().last().map(|b| b.id.as_str()),
            session.current_folder()
        );

        // An index naming a folder outside the trail falls back to a push
        session.navigate_to(Some("f9"), Some(1), Some("Extra"));
        let ids: Vec<_> = session.breadcrumbs().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["f1", "f2", "f9"]);
    }

    #[tokio::test]
    async fn test_store_evicts_least_recent_session_per_user() {
        let store = SessionStore::new(10, 2);
        let key = |client: &str| SessionKey::new("u1", Some(client.to_string()));

        let first = store.get_or_create(&key("a")).await;
        store.get_or_create(&key("b")).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        // Touching "a" makes "b" the oldest
        store.get_or_create(&key("a")).await;
        store.get_or_create(&SessionKey::new("u2", None)).await;
        store.get_or_create(&key("c")).await;

        assert_eq!(store.len().await, 3);
        assert!(Arc::ptr_eq(&first, &store.get_or_create(&key("a")).await));
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_store_cleanup_drops_idle_sessions_not_in_use() {
        let store = SessionStore::new(10, 4);
        let held = store.get_or_create(&SessionKey::new("u1", None)).await;
        drop(store.get_or_create(&SessionKey::new("u2", None)).await);

        assert_eq!(store.cleanup(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.cleanup(Duration::ZERO).await, 1);
        assert_eq!(store.len().await, 1);

        drop(held);
        assert_eq!(store.cleanup(Duration::ZERO).await, 1);
        assert_eq!(store.len().await, 0);
    }
}
