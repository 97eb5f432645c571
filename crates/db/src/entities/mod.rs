//! Database entities.

pub mod content_item;
pub mod course;
pub mod user;

pub use content_item::Entity as ContentItem;
pub use course::Entity as Course;
pub use user::Entity as User;
