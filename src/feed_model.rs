use chrono::{DateTime, Utc};

pub const RSS_FILE_NAME: &str = "feed.xml";
pub const JSON_FILE_NAME: &str = "feed.json";
pub const FEED_DIR: &str = "rss";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedAuthor {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedLinks {
    pub rss2: String,
    pub json: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub id: String,
    pub link: String,
    pub description: String,
    pub content: String,
    pub author: FeedAuthor,
    pub published: DateTime<Utc>,
    pub updated: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
}

/// Serialization-ready feed. Built once by the assembler, then only read.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedModel {
    pub title: String,
    pub description: String,
    pub site_url: String,
    pub language: String,
    pub image: String,
    pub favicon: String,
    pub author: FeedAuthor,
    pub copyright: String,
    pub generator: String,
    pub generated_at: Option<DateTime<Utc>>,
    pub feed_links: FeedLinks,
    pub items: Vec<FeedItem>,
}
