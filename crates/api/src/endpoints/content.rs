//! Content endpoints: listing, search, reordering and authoring.

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    response::IntoResponse,
    routing::post,
};
use coursedesk_common::{AppError, AppResult};
use coursedesk_core::{ContentDraft, LocalFile, NavigationSession, View};
use coursedesk_db::entities::content_item::{self, ContentKind, Section};
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::CurrentSession,
    middleware::AppState,
    response::{self, ApiResponse, FormatParams, SessionView},
};

/// List section request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    pub section: String,
    pub folder_id: Option<String>,
}

/// Title filter request. An empty term clears the filter.
#[derive(Debug, Deserialize, Validate)]
pub struct FilterRequest {
    #[validate(length(max = 200))]
    #[serde(default)]
    pub term: String,
}

/// Reorder request: every displayed id, top to bottom.
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderRequest {
    #[validate(length(min = 1, message = "Nothing to reorder"))]
    pub ids: Vec<String>,
}

/// Request naming one item.
#[derive(Debug, Deserialize, Validate)]
pub struct ItemIdRequest {
    #[validate(length(min = 1))]
    pub id: String,
}

fn parse_section(name: &str) -> AppResult<Section> {
    Section::from_tab_name(name)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown section: {name}")))
}

fn parse_kind(name: &str) -> AppResult<ContentKind> {
    match name {
        "folder" => Ok(ContentKind::Folder),
        "video" => Ok(ContentKind::Video),
        "file" => Ok(ContentKind::File),
        "announcement" => Ok(ContentKind::Announcement),
        other => Err(AppError::BadRequest(format!("Unknown kind: {other}"))),
    }
}

fn require_admin(current: &CurrentSession) -> AppResult<()> {
    if current.user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Re-list the session after a write, keeping the write's result on failure.
async fn refresh_after_write(state: &AppState, session: &mut NavigationSession) {
    if session.listing().is_none() {
        return;
    }
    if let Err(err) = state.content_tree.refresh(session).await {
        tracing::warn!(error = %err, "Could not refresh listing after write");
    }
}

/// List one folder of a section without recording history.
async fn list(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<ListRequest>,
) -> AppResult<SessionView> {
    let section = parse_section(&req.section)?;
    let folder_id = req.folder_id.filter(|id| !id.is_empty());

    let mut session = current.session.lock().await;
    let course = session.require_course()?.clone();
    let items = state
        .content_tree
        .children(&course, section, folder_id.as_deref())
        .await?;

    let view = View::Section(section);
    if session.view() != view {
        session.set_view(view);
    }
    if session.current_folder() != folder_id.as_deref() {
        session.navigate_to(folder_id.as_deref(), None, None);
    }
    session.set_listing(items);

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn filter(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<FilterRequest>,
) -> AppResult<SessionView> {
    req.validate()?;

    let mut session = current.session.lock().await;
    if session.listing().is_none() {
        return Err(AppError::Conflict("Nothing is listed to search".to_string()));
    }
    state.content_tree.filter_by_title(&mut session, req.term.trim());

    Ok(SessionView::render(&session, &format, current.user.is_admin()))
}

async fn reorder(
    current: CurrentSession,
    State(state): State<AppState>,
    Query(format): Query<FormatParams>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<SessionView> {
    require_admin(&current)?;
    req.validate()?;

    let mut session = current.session.lock().await;
    state.reorder_service.reorder(&mut session, &req.ids).await?;

    Ok(SessionView::render(&session, &format, true))
}

/// Multipart fields of the editor form, before defaults are applied.
#[derive(Debug, Default)]
struct SaveForm {
    id: Option<String>,
    section: Option<String>,
    kind: Option<String>,
    parent_id: Option<Option<String>>,
    order: Option<String>,
    title: Option<String>,
    body: Option<String>,
    primary_url: Option<String>,
    sub_group_code: Option<String>,
    topic_index: Option<String>,
    topic_label: Option<String>,
    files: Vec<LocalFile>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<SaveForm> {
    let mut form = SaveForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "files" || name == "file" {
            let display_name = field.file_name().unwrap_or("").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;

            // Browsers send an empty part for an untouched file input
            if display_name.is_empty() && bytes.is_empty() {
                continue;
            }
            form.files.push(LocalFile {
                bytes: bytes.to_vec(),
                display_name: if display_name.is_empty() {
                    "unnamed".to_string()
                } else {
                    display_name
                },
                content_type,
            });
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        match name.as_str() {
            "id" => form.id = Some(text),
            "section" => form.section = Some(text),
            "kind" => form.kind = Some(text),
            "parentId" => {
                form.parent_id = Some(if text.is_empty() || text == "null" {
                    None
                } else {
                    Some(text)
                });
            }
            "order" => form.order = Some(text),
            "title" => form.title = Some(text),
            "body" => form.body = Some(text),
            "primaryUrl" => form.primary_url = Some(text),
            "subGroupCode" => form.sub_group_code = Some(text),
            "topicIndex" => form.topic_index = Some(text),
            "topicLabel" => form.topic_label = Some(text),
            _ => {}
        }
    }

    Ok(form)
}

/// `None` when the field was not sent, `Some(None)` when it was sent blank.
fn parse_number(field: &str, value: Option<String>) -> AppResult<Option<Option<i32>>> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(text) => text
            .parse()
            .map(|n| Some(Some(n)))
            .map_err(|_| AppError::BadRequest(format!("{field} must be a whole number"))),
    }
}

impl SaveForm {
    /// Fill in what the form left out from the session's scope.
    fn into_draft(self, session: &NavigationSession) -> AppResult<(ContentDraft, Vec<LocalFile>)> {
        let course = session.require_course()?;

        let section = match self.section.as_deref().filter(|s| !s.is_empty()) {
            Some(name) => parse_section(name)?,
            None => session.require_section()?,
        };
        let kind = parse_kind(
            self.kind
                .as_deref()
                .ok_or_else(|| AppError::BadRequest("kind is required".to_string()))?,
        )?;
        let parent_id = match self.parent_id {
            Some(explicit) => explicit,
            None => session.current_folder().map(ToString::to_string),
        };
        let id = self.id.filter(|id| !id.is_empty());

        // New items land in the sub-group being previewed; edits keep theirs
        let sub_group_code = match self.sub_group_code {
            Some(code) => Some(Some(code)),
            None if id.is_none() => Some(course.sub_group.clone()),
            None => None,
        };

        let draft = ContentDraft {
            id,
            course_id: course.course_id.clone(),
            sub_group_code,
            section,
            kind,
            parent_id,
            order: parse_number("order", self.order)?,
            title: self.title.unwrap_or_default(),
            body: self.body,
            primary_url: self.primary_url,
            topic_index: parse_number("topicIndex", self.topic_index)?,
            topic_label: self.topic_label.map(Some),
        };
        Ok((draft, self.files))
    }
}

/// Create or edit an item from the editor form.
async fn save(
    current: CurrentSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<ApiResponse<content_item::Model>> {
    require_admin(&current)?;
    let form = read_form(multipart).await?;

    let mut session = current.session.lock().await;
    let (draft, files) = form.into_draft(&session)?;

    let item = state
        .content_service
        .save_item(&current.user.id, draft, files)
        .await?;

    refresh_after_write(&state, &mut session).await;
    Ok(ApiResponse::ok(item))
}

async fn delete(
    current: CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<ItemIdRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&current)?;
    req.validate()?;

    let mut session = current.session.lock().await;
    state.content_service.delete_item(&req.id).await?;

    refresh_after_write(&state, &mut session).await;
    Ok(response::ok())
}

/// Fetch one item. Students only see items of their own course and sub-group.
async fn show(
    current: CurrentSession,
    State(state): State<AppState>,
    Json(req): Json<ItemIdRequest>,
) -> AppResult<ApiResponse<content_item::Model>> {
    req.validate()?;

    let viewer = if current.user.is_admin() {
        None
    } else {
        let course_id = current
            .user
            .course_id
            .clone()
            .ok_or_else(|| AppError::Forbidden("You are not enrolled in a course".to_string()))?;
        Some(coursedesk_core::CourseContext {
            course_id,
            sub_group: current.user.sub_group_code.clone(),
        })
    };

    let item = state
        .content_service
        .get_item(&req.id, viewer.as_ref())
        .await?;
    Ok(ApiResponse::ok(item))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/filter", post(filter))
        .route("/reorder", post(reorder))
        .route("/save", post(save))
        .route("/delete", post(delete))
        .route("/show", post(show))
}
