use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;

pub mod content_file;
pub mod content_renderer;
pub mod frontmatter;
pub mod parsing_utils;
pub mod repository;
pub mod structured_renderer;

/// One authored article, as loaded by a [`repository::ContentRepository`].
/// Timestamps are UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub slug: Slug,
    pub title: String,
    pub description: String,
    pub published: NaiveDateTime,
    pub updated: Option<NaiveDateTime>,
    pub author: String,
    pub tags: Vec<String>,
    pub draft: bool,
    pub body: String,
    pub source: PathBuf,
}

#[derive(Debug, Clone, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub struct Slug(pub String);

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    Succeeded,
    FallenBack,
}

/// Renderer output for one entry.
#[derive(Debug, Clone)]
pub struct RenderedItem {
    pub entry: Arc<ContentEntry>,
    pub url: String,
    pub content: String,
    pub status: RenderStatus,
    pub layer: &'static str,
    pub fallback_reason: Option<String>,
}
