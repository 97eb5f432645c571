//! Drag-and-drop reordering of sibling items.

use std::collections::HashSet;

use coursedesk_common::{AppError, AppResult};
use coursedesk_db::repositories::ContentItemRepository;

use super::content_tree::ContentTreeService;
use super::session::NavigationSession;

/// Persists a new sibling order for the listing a session displays.
#[derive(Clone)]
pub struct ReorderService {
    item_repo: ContentItemRepository,
    tree: ContentTreeService,
}

impl ReorderService {
    #[must_use]
    pub const fn new(item_repo: ContentItemRepository, tree: ContentTreeService) -> Self {
        Self { item_repo, tree }
    }

    /// Store `ids` (top to bottom) as orders `1..=N`.
    ///
    /// When the write fails the session is reset to a fresh listing from the
    /// store, then the write error is returned.
    pub async fn reorder(&self, session: &mut NavigationSession, ids: &[String]) -> AppResult<()> {
        let orders = Self::plan(session, ids)?;

        match self.item_repo.bulk_update_order(&orders).await {
            Ok(()) => {
                session.apply_order(&orders);
                tracing::info!(count = orders.len(), "Reordered content");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Reorder failed, restoring listing from store");
                if let Err(refresh_err) = self.tree.refresh(session).await {
                    tracing::warn!(error = %refresh_err, "Could not restore listing after failed reorder");
                }
                Err(err)
            }
        }
    }

    /// Check the request against the displayed listing and assign orders.
    fn plan(session: &NavigationSession, ids: &[String]) -> AppResult<Vec<(String, i32)>> {
        let listing = session
            .listing()
            .ok_or_else(|| AppError::Conflict("Nothing is listed to reorder".to_string()))?;

        if session.is_filtered() {
            return Err(AppError::Conflict(
                "Clear the search filter before reordering".to_string(),
            ));
        }

        let displayed: HashSet<&str> = listing.iter().map(|i| i.id.as_str()).collect();
        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !displayed.contains(id.as_str()) {
                return Err(AppError::Validation(format!("Item {id} is not in this folder")));
            }
            if !seen.insert(id.as_str()) {
                return Err(AppError::Validation(format!("Item {id} appears twice")));
            }
        }
        if seen.len() != displayed.len() {
            return Err(AppError::Validation(
                "Every item in the folder must be placed".to_string(),
            ));
        }

        ids.iter()
            .enumerate()
            .map(|(index, id)| {
                i32::try_from(index + 1)
                    .map(|order| (id.clone(), order))
                    .map_err(|_| AppError::Validation("Too many items to reorder".to_string()))
            })
            .collect()
    }
}
