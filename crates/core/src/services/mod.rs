//! Business logic services.

#![allow(missing_docs)]

pub mod content;
pub mod content_tree;
pub mod course;
pub mod navigator;
pub mod reorder;
pub mod session;
pub mod student;
pub mod uploader;
pub mod user;

pub use content::{ContentDraft, ContentService};
pub use content_tree::{ContentTreeService, ListingScope, filter_by_title, filter_children, sort_siblings};
pub use course::{CourseInput, CourseService};
pub use navigator::Navigator;
pub use reorder::ReorderService;
pub use session::{
    Breadcrumb, CourseContext, History, HistoryEntry, NavigationSession, SessionKey,
    SessionSnapshot, SessionStore, View,
};
pub use student::StudentService;
pub use uploader::{AttachmentUploader, LocalFile};
pub use user::UserService;
