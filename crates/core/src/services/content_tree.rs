//! Content tree listing.

use std::cmp::Ordering;

use coursedesk_common::{AppError, AppResult};
use coursedesk_db::{
    entities::content_item::{self, Section},
    repositories::ContentItemRepository,
};

use super::session::{CourseContext, NavigationSession};

/// Which siblings a listing selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingScope<'a> {
    /// Viewer's sub-group; `None` sees global items only.
    pub sub_group: Option<&'a str>,
    pub section: Section,
    /// Containing folder; `None` lists the section root.
    pub parent_id: Option<&'a str>,
}

/// Select the items belonging to `scope`.
///
/// Filters apply in order: sub-group visibility, then section, then parent.
#[must_use]
pub fn filter_children(
    items: Vec<content_item::Model>,
    scope: &ListingScope<'_>,
) -> Vec<content_item::Model> {
    items
        .into_iter()
        .filter(|item| item.is_visible_to(scope.sub_group))
        .filter(|item| item.section == scope.section)
        .filter(|item| item.parent_id.as_deref() == scope.parent_id)
        .collect()
}

/// Sort siblings for display.
///
/// Ascending `order` with unordered items last; ties go to the newest item.
pub fn sort_siblings(items: &mut [content_item::Model]) {
    items.sort_by(|a, b| match (a.order, b.order) {
        (Some(x), Some(y)) if x != y => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => b.created_at.cmp(&a.created_at),
    });
}

/// Case-insensitive title match, keeping the input order.
#[must_use]
pub fn filter_by_title(items: &[content_item::Model], term: &str) -> Vec<content_item::Model> {
    let needle = term.to_lowercase();
    items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Lists the children of a folder for a navigation session.
#[derive(Clone)]
pub struct ContentTreeService {
    item_repo: ContentItemRepository,
}

impl ContentTreeService {
    #[must_use]
    pub const fn new(item_repo: ContentItemRepository) -> Self {
        Self { item_repo }
    }

    /// List one folder of one section and store it in the session.
    ///
    /// On failure the session's previous listing is kept.
    pub async fn list_children(
        &self,
        session: &mut NavigationSession,
        course_id: &str,
        sub_group: Option<&str>,
        section: Section,
        parent_id: Option<&str>,
    ) -> AppResult<()> {
        let items = self.fetch_children(course_id, sub_group, section, parent_id).await?;
        session.set_listing(items);
        Ok(())
    }

    /// The sorted children of a folder as `course` sees them, without
    /// touching any session.
    pub async fn children(
        &self,
        course: &CourseContext,
        section: Section,
        parent_id: Option<&str>,
    ) -> AppResult<Vec<content_item::Model>> {
        self.fetch_children(&course.course_id, course.sub_group.as_deref(), section, parent_id)
            .await
    }

    /// Re-list whatever the session is currently scoped to.
    pub async fn refresh(&self, session: &mut NavigationSession) -> AppResult<()> {
        let course = session.require_course()?.clone();
        let section = session.require_section()?;
        let parent_id = session.current_folder().map(ToString::to_string);

        self.list_children(
            session,
            &course.course_id,
            course.sub_group.as_deref(),
            section,
            parent_id.as_deref(),
        )
        .await
    }

    /// Narrow the session's listing by title without querying again.
    pub fn filter_by_title(
        &self,
        session: &mut NavigationSession,
        term: &str,
    ) -> Vec<content_item::Model> {
        session.set_filter(term);
        session.displayed_items()
    }

    async fn fetch_children(
        &self,
        course_id: &str,
        sub_group: Option<&str>,
        section: Section,
        parent_id: Option<&str>,
    ) -> AppResult<Vec<content_item::Model>> {
        let all = self.item_repo.find_by_course(course_id).await?;

        // Only a folder of this section the viewer can see may be opened
        if let Some(folder_id) = parent_id
            && !all.iter().any(|item| {
                item.id == folder_id
                    && item.kind.is_folder()
                    && item.section == section
                    && item.is_visible_to(sub_group)
            })
        {
            return Err(AppError::ContentNotFound(folder_id.to_string()));
        }

        let scope = ListingScope {
            sub_group,
            section,
            parent_id,
        };

        let mut children = filter_children(all, &scope);
        sort_siblings(&mut children);

        tracing::debug!(
            course_id = %course_id,
            section = %section.as_str(),
            parent_id = ?parent_id,
            count = children.len(),
            "Listed content"
        );
        Ok(children)
    }
}
