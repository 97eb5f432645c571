//! Content item entity: a node in a course's content tree.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Top-level category partitioning a course's content tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "camelCase")]
pub enum Section {
    #[sea_orm(string_value = "content")]
    Content,
    #[sea_orm(string_value = "homework")]
    Homework,
    #[sea_orm(string_value = "summary")]
    Summary,
    #[sea_orm(string_value = "classified")]
    Classified,
    #[sea_orm(string_value = "revision")]
    Revision,
    #[sea_orm(string_value = "pastPapers")]
    PastPapers,
}

impl Section {
    /// Every section, in sidebar order.
    pub const ALL: [Self; 6] = [
        Self::Content,
        Self::Homework,
        Self::Summary,
        Self::Classified,
        Self::Revision,
        Self::PastPapers,
    ];

    /// Parse a tab name as sent by the dashboard shell.
    ///
    /// Accepts the old tab names `papers`, `videos` and `files`; nothing
    /// below the request boundary ever sees them.
    #[must_use]
    pub fn from_tab_name(name: &str) -> Option<Self> {
        match name {
            "content" | "videos" | "files" => Some(Self::Content),
            "homework" => Some(Self::Homework),
            "summary" => Some(Self::Summary),
            "classified" => Some(Self::Classified),
            "revision" => Some(Self::Revision),
            "pastPapers" | "papers" => Some(Self::PastPapers),
            _ => None,
        }
    }

    /// Stable tab name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Homework => "homework",
            Self::Summary => "summary",
            Self::Classified => "classified",
            Self::Revision => "revision",
            Self::PastPapers => "pastPapers",
        }
    }

    /// Heading shown above the section root.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Content => "Way to Content",
            Self::Homework => "Homework Assignments",
            Self::Summary => "Summaries",
            Self::Classified => "Classified Questions",
            Self::Revision => "Final Revision",
            Self::PastPapers => "Past Papers",
        }
    }
}

/// Kind of a content item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// Contains other items.
    #[sea_orm(string_value = "folder")]
    Folder,
    #[sea_orm(string_value = "video")]
    Video,
    #[sea_orm(string_value = "file")]
    File,
    #[sea_orm(string_value = "announcement")]
    Announcement,
}

impl ContentKind {
    /// Whether items of this kind can contain children.
    #[must_use]
    pub const fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }

    /// Whether this kind needs a link or an attachment to be useful.
    #[must_use]
    pub const fn needs_link(self) -> bool {
        matches!(self, Self::Video | Self::File)
    }
}

/// Coarse media type of an uploaded attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaType {
    Video,
    File,
}

impl MediaType {
    /// Infer from a MIME type: `video/*` is a video, everything else a file.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        if mime.to_ascii_lowercase().starts_with("video/") {
            Self::Video
        } else {
            Self::File
        }
    }
}

/// An uploaded blob referenced by a content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub media_type: MediaType,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning course
    #[sea_orm(indexed)]
    pub course_id: String,

    /// Audience restriction within the course (null = whole course)
    #[sea_orm(nullable)]
    pub sub_group_code: Option<String>,

    pub section: Section,

    pub kind: ContentKind,

    /// Containing folder (null = section root)
    #[sea_orm(nullable, indexed)]
    pub parent_id: Option<String>,

    /// Sibling display order (null sorts last)
    #[sea_orm(column_name = "sort_order", nullable)]
    pub order: Option<i32>,

    pub title: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub body: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub primary_url: Option<String>,

    /// Ordered list of [`Attachment`]
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Json,

    #[sea_orm(nullable)]
    pub topic_index: Option<i32>,

    #[sea_orm(nullable)]
    pub topic_label: Option<String>,

    pub author_id: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Decode the attachment list. Malformed entries are skipped.
    #[must_use]
    pub fn attachment_list(&self) -> Vec<Attachment> {
        match &self.attachments {
            Json::Array(values) => values
                .iter()
                .filter_map(|v| serde_json::from_value(v.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a viewer in `sub_group` may see this item.
    #[must_use]
    pub fn is_visible_to(&self, sub_group: Option<&str>) -> bool {
        match self.sub_group_code.as_deref() {
            None => true,
            Some(code) => sub_group == Some(code),
        }
    }
}

/// Encode an attachment list for the `attachments` column.
#[must_use]
pub fn attachments_to_json(attachments: &[Attachment]) -> Json {
    serde_json::to_value(attachments).unwrap_or_else(|_| Json::Array(Vec::new()))
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_delete = "Cascade"
    )]
    Course,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
