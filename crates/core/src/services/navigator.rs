//! Tab and folder navigation with replayable history.

use coursedesk_common::AppResult;

use super::content_tree::ContentTreeService;
use super::session::{HistoryEntry, NavigationSession, View};

/// Drives view and folder changes for a session.
///
/// Every forward navigation pushes a [`HistoryEntry`]; replaying an entry
/// (back, forward or a client-side history pop) never pushes.
#[derive(Clone)]
pub struct Navigator {
    tree: ContentTreeService,
}

impl Navigator {
    #[must_use]
    pub const fn new(tree: ContentTreeService) -> Self {
        Self { tree }
    }

    /// Make `view` active at its root. Section views are listed immediately.
    pub async fn activate(
        &self,
        session: &mut NavigationSession,
        view: View,
        replay: bool,
    ) -> AppResult<()> {
        if view.section().is_some() {
            session.require_course()?;
        }

        if !replay {
            session.history_mut().push(HistoryEntry::Tab { view });
        }
        session.set_view(view);

        if view.section().is_some() {
            self.tree.refresh(session).await?;
        }

        tracing::debug!(view = %view, replay, "Activated view");
        Ok(())
    }

    /// Open a folder (or the root, for `None`) in the active section.
    pub async fn navigate(
        &self,
        session: &mut NavigationSession,
        folder_id: Option<&str>,
        breadcrumb_index: Option<usize>,
        title: Option<&str>,
        replay: bool,
    ) -> AppResult<()> {
        let section = session.require_section()?;
        let course = session.require_course()?.clone();

        // Nothing changes unless the folder can be listed
        let children = self.tree.children(&course, section, folder_id).await?;

        if !replay {
            session.history_mut().push(HistoryEntry::Folder {
                section,
                folder_id: folder_id.map(ToString::to_string),
                title: title.map(ToString::to_string),
            });
        }

        session.navigate_to(folder_id, breadcrumb_index, title);
        session.set_listing(children);
        Ok(())
    }

    /// Step back in history. A no-op at the start.
    pub async fn back(&self, session: &mut NavigationSession) -> AppResult<()> {
        if !session.history_mut().back() {
            return Ok(());
        }
        let entry = session.history().current().cloned();
        self.replay(session, entry).await
    }

    /// Step forward in history. A no-op at the end.
    pub async fn forward(&self, session: &mut NavigationSession) -> AppResult<()> {
        if !session.history_mut().forward() {
            return Ok(());
        }
        let entry = session.history().current().cloned();
        self.replay(session, entry).await
    }

    /// Restore the state an entry describes without recording it again.
    ///
    /// `None` stands for the state before the first entry, which is Home.
    pub async fn replay(
        &self,
        session: &mut NavigationSession,
        entry: Option<HistoryEntry>,
    ) -> AppResult<()> {
        match entry {
            None => self.activate(session, View::Home, true).await,
            Some(HistoryEntry::Tab { view }) => self.activate(session, view, true).await,
            Some(HistoryEntry::Folder {
                section,
                folder_id,
                title,
            }) => {
                let view = View::Section(section);
                if session.view() != view {
                    session.set_view(view);
                }
                self.navigate(session, folder_id.as_deref(), None, title.as_deref(), true)
                    .await
            }
        }
    }
}
