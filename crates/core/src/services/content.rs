//! Content item authoring.

use chrono::Utc;
use coursedesk_common::{AppError, AppResult, IdGenerator};
use coursedesk_db::{
    entities::content_item::{self, ContentKind, Section, attachments_to_json},
    repositories::ContentItemRepository,
};
use sea_orm::Set;
use validator::Validate;

use super::session::CourseContext;
use super::uploader::{AttachmentUploader, LocalFile};

/// An item as submitted by the editor. `id` is set when editing.
///
/// The scoping fields are doubly optional: the outer `None` means the editor
/// did not send the field, so an edit keeps the stored value, while
/// `Some(None)` clears it.
#[derive(Debug, Clone, Validate)]
pub struct ContentDraft {
    pub id: Option<String>,
    pub course_id: String,
    pub sub_group_code: Option<Option<String>>,
    pub section: Section,
    pub kind: ContentKind,
    pub parent_id: Option<String>,
    pub order: Option<Option<i32>>,
    #[validate(length(max = 512))]
    pub title: String,
    pub body: Option<String>,
    #[validate(length(max = 2048))]
    pub primary_url: Option<String>,
    pub topic_index: Option<Option<i32>>,
    pub topic_label: Option<Option<String>>,
}

impl ContentDraft {
    /// Trim text fields and turn blanks into `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        self.title = self.title.trim().to_string();
        self.sub_group_code = self
            .sub_group_code
            .map(|code| clean(code).map(|c| c.to_uppercase()));
        self.parent_id = clean(self.parent_id);
        self.body = clean(self.body);
        self.primary_url = clean(self.primary_url);
        self.topic_label = self.topic_label.map(clean);
        if self.kind.is_folder() {
            self.body = None;
        }
        self
    }

    /// Checks that need nothing but the draft itself.
    fn validate_fields(&self, new_files: usize) -> AppResult<()> {
        self.validate()?;

        if self.title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if matches!(self.order, Some(Some(order)) if order < 1) {
            return Err(AppError::Validation(
                "Order must be 1 or greater".to_string(),
            ));
        }
        if self.kind.is_folder() && new_files > 0 {
            return Err(AppError::Validation(
                "Folders cannot carry attachments".to_string(),
            ));
        }
        if self.kind == ContentKind::Announcement && self.body.is_none() && self.primary_url.is_none()
        {
            return Err(AppError::Validation(
                "An announcement needs a message or a link".to_string(),
            ));
        }
        Ok(())
    }

    /// Videos and files must point somewhere.
    fn validate_link(&self, attachment_count: usize) -> AppResult<()> {
        if self.kind.needs_link() && self.primary_url.is_none() && attachment_count == 0 {
            return Err(AppError::Validation(
                "A link or at least one attachment is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Creates, edits, reads and deletes content items.
#[derive(Clone)]
pub struct ContentService {
    item_repo: ContentItemRepository,
    uploader: AttachmentUploader,
    id_gen: IdGenerator,
}

impl ContentService {
    #[must_use]
    pub const fn new(item_repo: ContentItemRepository, uploader: AttachmentUploader) -> Self {
        Self {
            item_repo,
            uploader,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new item or update an existing one.
    ///
    /// The draft is validated before anything is uploaded, and nothing is
    /// written unless every upload succeeded. Edits append the new
    /// attachments to the existing ones.
    pub async fn save_item(
        &self,
        author_id: &str,
        draft: ContentDraft,
        files: Vec<LocalFile>,
    ) -> AppResult<content_item::Model> {
        let draft = draft.normalized();
        draft.validate_fields(files.len())?;

        match draft.id.clone() {
            None => self.create_item(author_id, draft, &files).await,
            Some(id) => self.update_item(&id, draft, &files).await,
        }
    }

    async fn create_item(
        &self,
        author_id: &str,
        draft: ContentDraft,
        files: &[LocalFile],
    ) -> AppResult<content_item::Model> {
        draft.validate_link(files.len())?;

        if let Some(parent_id) = draft.parent_id.as_deref() {
            self.check_parent(&draft, parent_id).await?;
        }

        let attachments = self.uploader.upload_all(files).await?;

        let model = content_item::ActiveModel {
            id: Set(self.id_gen.generate()),
            course_id: Set(draft.course_id),
            sub_group_code: Set(draft.sub_group_code.flatten()),
            section: Set(draft.section),
            kind: Set(draft.kind),
            parent_id: Set(draft.parent_id),
            order: Set(draft.order.flatten()),
            title: Set(draft.title),
            body: Set(draft.body),
            primary_url: Set(draft.primary_url),
            attachments: Set(attachments_to_json(&attachments)),
            topic_index: Set(draft.topic_index.flatten()),
            topic_label: Set(draft.topic_label.flatten()),
            author_id: Set(author_id.to_string()),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.item_repo.create(model).await?;
        tracing::info!(
            id = %created.id,
            course_id = %created.course_id,
            kind = ?created.kind,
            attachments = attachments.len(),
            "Created content item"
        );
        Ok(created)
    }

    async fn update_item(
        &self,
        id: &str,
        draft: ContentDraft,
        files: &[LocalFile],
    ) -> AppResult<content_item::Model> {
        let existing = self.item_repo.get_by_id(id).await?;

        if existing.course_id != draft.course_id {
            return Err(AppError::Validation(
                "Item belongs to another course".to_string(),
            ));
        }
        if existing.kind != draft.kind {
            return Err(AppError::Validation("Item kind cannot change".to_string()));
        }

        let mut attachments = existing.attachment_list();
        draft.validate_link(attachments.len() + files.len())?;

        let uploaded = self.uploader.upload_all(files).await?;
        let appended = uploaded.len();
        attachments.extend(uploaded);

        let mut model: content_item::ActiveModel = existing.into();
        model.title = Set(draft.title);
        model.body = Set(draft.body);
        model.primary_url = Set(draft.primary_url);
        // Fields the editor left out keep their stored values
        if let Some(order) = draft.order {
            model.order = Set(order);
        }
        if let Some(code) = draft.sub_group_code {
            model.sub_group_code = Set(code);
        }
        if let Some(index) = draft.topic_index {
            model.topic_index = Set(index);
        }
        if let Some(label) = draft.topic_label {
            model.topic_label = Set(label);
        }
        model.attachments = Set(attachments_to_json(&attachments));
        model.updated_at = Set(Some(Utc::now().into()));

        let updated = self.item_repo.update(model).await?;
        tracing::info!(id = %updated.id, appended, "Updated content item");
        Ok(updated)
    }

    /// A parent must be a folder in the same course and section.
    async fn check_parent(&self, draft: &ContentDraft, parent_id: &str) -> AppResult<()> {
        let parent = self
            .item_repo
            .find_by_id(parent_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Parent folder not found: {parent_id}")))?;

        if !parent.kind.is_folder() {
            return Err(AppError::Validation(format!(
                "Parent {parent_id} is not a folder"
            )));
        }
        if parent.course_id != draft.course_id || parent.section != draft.section {
            return Err(AppError::Validation(format!(
                "Parent {parent_id} is in another course or section"
            )));
        }
        Ok(())
    }

    /// Delete an item. Folders must be empty first.
    pub async fn delete_item(&self, id: &str) -> AppResult<()> {
        let item = self.item_repo.get_by_id(id).await?;

        if item.kind.is_folder() {
            let children = self.item_repo.count_children(id).await?;
            if children > 0 {
                return Err(AppError::Conflict(format!(
                    "Folder still holds {children} item(s)"
                )));
            }
        }

        self.item_repo.delete(id).await?;
        tracing::info!(id = %id, kind = ?item.kind, "Deleted content item");
        Ok(())
    }

    /// Fetch one item. With a viewer, items outside their course or
    /// sub-group are reported as missing.
    pub async fn get_item(
        &self,
        id: &str,
        viewer: Option<&CourseContext>,
    ) -> AppResult<content_item::Model> {
        let item = self.item_repo.get_by_id(id).await?;

        if let Some(ctx) = viewer {
            if item.course_id != ctx.course_id || !item.is_visible_to(ctx.sub_group.as_deref()) {
                return Err(AppError::ContentNotFound(id.to_string()));
            }
        }
        Ok(item)
    }
}
