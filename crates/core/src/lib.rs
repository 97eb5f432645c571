//! Core business logic for coursedesk.

pub mod services;

pub use services::*;
