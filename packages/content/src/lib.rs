// ABOUTME: Site content managed from the admin dashboard
// ABOUTME: Blog posts, downloadable guides and the FAQ

pub mod articles;
pub mod faq;
pub mod types;

pub use articles::ArticleStorage;
pub use faq::FaqStorage;
pub use types::{
    Article, ArticleInput, ArticleKind, ArticleUpdateInput, FaqCategory, FaqEntry, FaqInput,
    DEFAULT_FAQ_CATEGORY,
};
