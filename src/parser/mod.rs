//! HTML content extraction: article text and selectable links.

pub mod article;
pub mod links;

pub use article::{extract_article, extract_text};
pub use links::{extract_links_with_context, LinkInfo};
