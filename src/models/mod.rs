//! Data models for Bloggy

mod post;

pub use post::{Post, POST_COLLECTION};
