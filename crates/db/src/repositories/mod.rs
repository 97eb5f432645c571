//! Database repositories.

mod content_item;
mod course;
mod user;

pub use content_item::ContentItemRepository;
pub use course::CourseRepository;
pub use user::UserRepository;
