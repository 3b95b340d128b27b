use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use spdlog::{info, warn};

use crate::article_selector::{filter_by_tags, select, select_limited};
use crate::config::Config;
use crate::content::content_renderer::ContentRenderer;
use crate::content::repository::{ContentRepository, FileRepository};
use crate::content::{ContentEntry, RenderStatus, RenderedItem, Slug};
use crate::error::{EntryProcessingError, FeedError};
use crate::feed_assembler::assemble;
use crate::output_writer::{self, WriteReport};
use crate::view::json_feed_renderer::to_json_feed;
use crate::view::rss_renderer::to_rss2;

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub slug: Slug,
    pub error: EntryProcessingError,
}

/// Entries that made it into the feed, and the ones that did not.
#[derive(Debug)]
pub struct ProcessedBatch {
    pub items: Vec<RenderedItem>,
    pub skipped: Vec<SkippedEntry>,
}

impl ProcessedBatch {
    pub fn fallen_back(&self) -> Vec<Slug> {
        self.items.iter()
            .filter(|item| item.status == RenderStatus::FallenBack)
            .map(|item| item.entry.slug.clone())
            .collect()
    }
}

#[derive(Debug)]
pub struct FeedReport {
    pub selected: usize,
    pub processed: usize,
    pub skipped: Vec<SkippedEntry>,
    pub fallen_back: Vec<Slug>,
    pub writes: WriteReport,
}

pub struct FeedPipeline<R: ContentRepository> {
    config: Config,
    repository: R,
    renderer: Arc<ContentRenderer>,
}

impl FeedPipeline<FileRepository> {
    /// Pipeline reading articles from `paths.content_dir`.
    pub fn from_config(config: Config) -> Self {
        let repository = FileRepository::new(
            config.paths.content_dir.clone(),
            config.index_base_name(),
            config.author.name.as_deref().unwrap_or_default(),
        );
        FeedPipeline::new(config, repository)
    }
}

impl<R: ContentRepository> FeedPipeline<R> {
    pub fn new(config: Config, repository: R) -> Self {
        FeedPipeline {
            config,
            repository,
            renderer: Arc::new(ContentRenderer::default()),
        }
    }

    pub fn with_renderer(mut self, renderer: ContentRenderer) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Build-completion hook: produces `rss/feed.xml` and `rss/feed.json`
    /// under the output directory.
    pub async fn on_build_done(&self) -> Result<FeedReport, FeedError> {
        info!("Starting feed generation");
        let site = self.config.site_identity()?;

        let entries = self.repository.entries()?;
        info!("Fetched {} articles", entries.len());

        let defaults = &self.config.defaults;
        let entries = filter_by_tags(entries, &defaults.tags);
        let selected = match defaults.item_limit {
            Some(limit) => select_limited(entries, limit, defaults.include_drafts),
            None => select(entries, defaults.include_drafts),
        };
        let selected_count = selected.len();

        let renderer = self.renderer.clone();
        let site_url = site.site_url.clone();
        let batch = tokio::task::spawn_blocking(move || process_entries(selected, &renderer, &site_url)).await?;

        if selected_count > 0 && batch.items.is_empty() {
            return Err(FeedError::NothingProcessed {
                selected: selected_count,
                skipped: batch.skipped.into_iter().map(|s| s.slug).collect(),
            });
        }

        let model = assemble(&batch.items, &site, Utc::now());
        let rss = to_rss2(&model)?;
        let json = to_json_feed(&model)?;

        info!("Writing feed files to {}", self.config.feed_dir().display());
        let writes = match output_writer::write(&self.config.feed_dir(), Ok(rss), Ok(json)).await {
            Ok(writes) => writes,
            Err(e) => return Err(FeedError::OutputDir(e)),
        };
        if !writes.is_complete() {
            return Err(FeedError::Output(writes));
        }

        let fallen_back = batch.fallen_back();
        if !fallen_back.is_empty() {
            warn!("{} articles were published with fallback content", fallen_back.len());
        }
        info!("Feed generation completed: {} articles, {} skipped", batch.items.len(), batch.skipped.len());

        Ok(FeedReport {
            selected: selected_count,
            processed: batch.items.len(),
            skipped: batch.skipped,
            fallen_back,
            writes,
        })
    }
}

/// Validates every entry, then renders the valid ones in parallel. Output
/// keeps the input order.
pub fn process_entries(entries: Vec<ContentEntry>, renderer: &ContentRenderer, site_url: &str) -> ProcessedBatch {
    let total = entries.len();
    let mut seen: HashSet<Slug> = HashSet::new();
    let mut valid: Vec<Arc<ContentEntry>> = Vec::with_capacity(total);
    let mut skipped = vec![];

    for entry in entries {
        match validate_entry(&entry, &mut seen) {
            Ok(()) => valid.push(Arc::new(entry)),
            Err(error) => {
                warn!("Error processing article {}: {}. Skipping it", entry.slug, error);
                skipped.push(SkippedEntry { slug: entry.slug, error });
            }
        }
    }

    let done = AtomicUsize::new(0);
    let items: Vec<RenderedItem> = valid
        .into_par_iter()
        .map(|entry| {
            let item = renderer.render(entry, site_url);
            let processed = done.fetch_add(1, Ordering::Relaxed) + 1;
            if processed % 5 == 0 {
                info!("Processed {}/{} articles", processed, total);
            }
            item
        })
        .collect();

    ProcessedBatch { items, skipped }
}

fn validate_entry(entry: &ContentEntry, seen: &mut HashSet<Slug>) -> Result<(), EntryProcessingError> {
    lazy_static! {
        static ref URL_SAFE_SLUG: Regex = Regex::new(r"^[^\s/\\?#%]+$").unwrap();
    }

    let slug = entry.slug.0.as_str();
    if !URL_SAFE_SLUG.is_match(slug) || slug == "." || slug == ".." {
        return Err(EntryProcessingError::InvalidSlug(slug.to_string()));
    }
    if entry.title.trim().is_empty() {
        return Err(EntryProcessingError::EmptyTitle);
    }
    check_year("publish", &entry.published)?;
    if let Some(ref updated) = entry.updated {
        check_year("update", updated)?;
    }
    if !seen.insert(entry.slug.clone()) {
        return Err(EntryProcessingError::DuplicateSlug(slug.to_string()));
    }
    Ok(())
}

// RFC 2822 can only carry four digit, non negative years
fn check_year(field: &'static str, dt: &NaiveDateTime) -> Result<(), EntryProcessingError> {
    if (0..=9999).contains(&dt.year()) {
        Ok(())
    } else {
        Err(EntryProcessingError::TimestampOutOfRange { field, value: dt.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use chrono::NaiveDate;
    use quick_xml::events::Event;
    use quick_xml::Reader;
    use tempfile::TempDir;

    use crate::config::parse_config;
    use crate::content::content_renderer::{DescriptionLayer, RenderLayer, PLACEHOLDER};
    use crate::error::ConfigurationError;
    use crate::test_data::{ARTICLE_MDX, ARTICLE_MINIMAL, ARTICLE_UNKNOWN_COMPONENT};

    use super::*;

    fn create_entry(slug: &str, y: i32, m: u32, d: u32, draft: bool) -> ContentEntry {
        ContentEntry {
            slug: Slug(slug.to_string()),
            title: format!("title-of-{}", slug),
            description: format!("summary-of-{}", slug),
            published: NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            updated: None,
            author: "thiago".to_string(),
            tags: vec![],
            draft,
            body: format!("Body of *{}*", slug),
            source: PathBuf::from(format!("{}.md", slug)),
        }
    }

    fn config(output_dir: &Path, extra: &str) -> Config {
        let toml = format!(r##"
[site]
url = "https://thiagocafe.com"
title = "Thiago Cafe"
description = "My blog feed"

[author]
name = "Thiago"
email = "thiago@example.com"

[paths]
content_dir = "{}"
output_dir = "{}"

[defaults]
{}
"##, output_dir.join("content").display(), output_dir.join("public").display(), extra);
        parse_config(&toml).unwrap()
    }

    fn rss_item_titles(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut titles = vec![];
        let mut in_item = false;
        let mut in_title = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"item" => in_item = true,
                Event::Start(e) if e.name().as_ref() == b"title" => in_title = in_item,
                Event::Text(t) if in_title => titles.push(t.unescape().unwrap().to_string()),
                Event::End(e) if e.name().as_ref() == b"title" => in_title = false,
                Event::End(e) if e.name().as_ref() == b"item" => in_item = false,
                Event::Eof => break,
                _ => {}
            }
        }
        titles
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_process_entries_isolates_failures() {
        let mut bad_title = create_entry("no-title", 2024, 1, 4, false);
        bad_title.title = "  ".to_string();
        let mut far_future = create_entry("future", 2024, 1, 5, false);
        far_future.published = NaiveDate::from_ymd_opt(10000, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut placeholder = create_entry("empty", 2024, 1, 6, false);
        placeholder.body = "".to_string();
        placeholder.description = "".to_string();

        let entries = vec![
            create_entry("first", 2024, 1, 3, false),
            bad_title,
            create_entry("bad slug", 2024, 1, 2, false),
            create_entry("first", 2024, 1, 1, false),
            far_future,
            placeholder,
            create_entry("last", 2023, 1, 1, false),
        ];

        let batch = process_entries(entries, &ContentRenderer::default(), "https://thiagocafe.com");
        let slugs: Vec<&str> = batch.items.iter().map(|i| i.entry.slug.0.as_str()).collect();
        assert_eq!(slugs, ["first", "empty", "last"]);
        assert_eq!(batch.items[0].content, "<p>Body of <em>first</em></p>");
        assert_eq!(batch.items[1].content, PLACEHOLDER);
        assert_eq!(batch.fallen_back(), vec![Slug("empty".to_string())]);

        let skipped: Vec<(&str, &EntryProcessingError)> = batch.skipped.iter().map(|s| (s.slug.0.as_str(), &s.error)).collect();
        assert_eq!(skipped.len(), 4);
        assert_eq!(skipped[0], ("no-title", &EntryProcessingError::EmptyTitle));
        assert_eq!(skipped[1], ("bad slug", &EntryProcessingError::InvalidSlug("bad slug".to_string())));
        assert_eq!(skipped[2], ("first", &EntryProcessingError::DuplicateSlug("first".to_string())));
        assert!(matches!(skipped[3].1, EntryProcessingError::TimestampOutOfRange { field: "publish", .. }));
    }

    #[test]
    fn test_process_keeps_order_in_parallel() {
        let entries: Vec<ContentEntry> = (0..64u32)
            .map(|i| create_entry(&format!("post-{}", i), 2024, 1, 1 + (i % 28), false))
            .collect();
        let expected: Vec<String> = entries.iter().map(|e| e.slug.0.clone()).collect();
        let batch = process_entries(entries, &ContentRenderer::default(), "https://thiagocafe.com");
        let got: Vec<String> = batch.items.iter().map(|i| i.entry.slug.0.clone()).collect();
        assert_eq!(got, expected);
    }

    #[tokio::test]
    async fn test_pipeline_writes_both_feeds() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![
            create_entry("jan", 2024, 1, 1, false),
            create_entry("mar", 2024, 3, 1, true),
            create_entry("feb", 2024, 2, 1, false),
        ];
        let pipeline = FeedPipeline::new(config(tmp.path(), ""), entries);

        let report = pipeline.on_build_done().await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.processed, 2);
        assert!(report.skipped.is_empty());
        assert!(report.fallen_back.is_empty());
        assert!(report.writes.is_complete());

        let feed_dir = tmp.path().join("public").join("rss");
        let xml = read(feed_dir.join("feed.xml"));
        assert_eq!(rss_item_titles(&xml), ["title-of-feb", "title-of-jan"]);
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.contains(r#"<atom:link href="https://thiagocafe.com/rss/feed.xml" rel="self""#));
        assert!(xml.contains(r#"<atom:link href="https://thiagocafe.com/rss/feed.json" rel="alternate""#));

        let json: serde_json::Value = serde_json::from_str(&read(feed_dir.join("feed.json"))).unwrap();
        let ids: Vec<&str> = json["items"].as_array().unwrap().iter().map(|i| i["id"].as_str().unwrap()).collect();
        assert_eq!(ids, ["https://thiagocafe.com/articles/feb", "https://thiagocafe.com/articles/jan"]);
    }

    struct ChartOnly;

    impl RenderLayer for ChartOnly {
        fn name(&self) -> &'static str {
            "chart-only"
        }

        fn attempt(&self, _entry: &ContentEntry, _url: &str) -> Result<String, crate::error::EntryRenderError> {
            Err(crate::error::EntryRenderError::MissingComponent("Chart".to_string()))
        }
    }

    #[tokio::test]
    async fn test_pipeline_reports_fallen_back_entries() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![create_entry("a", 2024, 1, 1, false), create_entry("b", 2024, 1, 2, false)];
        let renderer = ContentRenderer::with_layers(vec![Box::new(ChartOnly), Box::new(DescriptionLayer)]);
        let pipeline = FeedPipeline::new(config(tmp.path(), ""), entries).with_renderer(renderer);

        let report = pipeline.on_build_done().await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.fallen_back, vec![Slug("b".to_string()), Slug("a".to_string())]);

        let json: serde_json::Value = serde_json::from_str(&read(tmp.path().join("public").join("rss").join("feed.json"))).unwrap();
        assert_eq!(json["items"][0]["content_html"], "summary-of-b");
    }

    #[tokio::test]
    async fn test_pipeline_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![create_entry("a", 2024, 1, 1, false), create_entry("b", 2024, 1, 1, false)];
        let pipeline = FeedPipeline::new(config(tmp.path(), "include_drafts = true"), entries);
        let feed_dir = tmp.path().join("public").join("rss");

        pipeline.on_build_done().await.unwrap();
        let first = (read(feed_dir.join("feed.xml")), read(feed_dir.join("feed.json")));
        pipeline.on_build_done().await.unwrap();
        let second = (read(feed_dir.join("feed.xml")), read(feed_dir.join("feed.json")));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pipeline_limit_and_drafts() {
        let tmp = TempDir::new().unwrap();
        let entries = vec![
            create_entry("jan", 2024, 1, 1, false),
            create_entry("mar", 2024, 3, 1, true),
            create_entry("feb", 2024, 2, 1, false),
        ];
        let pipeline = FeedPipeline::new(config(tmp.path(), "include_drafts = true\nitem_limit = 2"), entries);
        let report = pipeline.on_build_done().await.unwrap();
        assert_eq!(report.processed, 2);

        let xml = read(tmp.path().join("public").join("rss").join("feed.xml"));
        assert_eq!(rss_item_titles(&xml), ["title-of-mar", "title-of-feb"]);
    }

    #[tokio::test]
    async fn test_pipeline_empty_collection() {
        let tmp = TempDir::new().unwrap();
        let pipeline = FeedPipeline::new(config(tmp.path(), ""), Vec::<ContentEntry>::new());
        let report = pipeline.on_build_done().await.unwrap();
        assert_eq!(report.processed, 0);

        let feed_dir = tmp.path().join("public").join("rss");
        let xml = read(feed_dir.join("feed.xml"));
        assert!(rss_item_titles(&xml).is_empty());
        assert!(xml.contains("<channel>"));
        let json: serde_json::Value = serde_json::from_str(&read(feed_dir.join("feed.json"))).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_pipeline_nothing_processed_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut entry = create_entry("only", 2024, 1, 1, false);
        entry.title = "".to_string();
        let pipeline = FeedPipeline::new(config(tmp.path(), ""), vec![entry]);

        let res = pipeline.on_build_done().await;
        assert!(matches!(res, Err(FeedError::NothingProcessed { selected: 1, .. })));
        assert!(!tmp.path().join("public").join("rss").join("feed.xml").exists());
    }

    #[tokio::test]
    async fn test_pipeline_requires_site_url() {
        let tmp = TempDir::new().unwrap();
        let mut cfg = config(tmp.path(), "");
        cfg.site.url = None;
        let pipeline = FeedPipeline::new(cfg, vec![create_entry("a", 2024, 1, 1, false)]);

        let res = pipeline.on_build_done().await;
        assert!(matches!(res, Err(FeedError::Configuration(ConfigurationError::MissingSiteUrl))));
        assert!(!tmp.path().join("public").exists());
    }

    #[tokio::test]
    async fn test_pipeline_reports_partial_write() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("public").join("rss").join("feed.json").join("taken")).unwrap();
        let pipeline = FeedPipeline::new(config(tmp.path(), ""), vec![create_entry("a", 2024, 1, 1, false)]);

        match pipeline.on_build_done().await {
            Err(FeedError::Output(report)) => {
                assert!(report.rss.is_ok());
                assert!(report.json.is_err());
            }
            other => panic!("expected a partial write, got {:?}", other),
        }
        assert!(tmp.path().join("public").join("rss").join("feed.xml").is_file());
    }

    #[tokio::test]
    async fn test_pipeline_from_content_dir() {
        let tmp = TempDir::new().unwrap();
        let content = tmp.path().join("content");
        fs::create_dir_all(content.join("what-i-learned")).unwrap();
        fs::write(content.join("what-i-learned").join("index.mdx"), ARTICLE_MDX).unwrap();
        fs::write(content.join("minimal.md"), ARTICLE_MINIMAL).unwrap();
        fs::write(content.join("semantic-html.mdx"), ARTICLE_UNKNOWN_COMPONENT).unwrap();

        let pipeline = FeedPipeline::from_config(config(tmp.path(), ""));
        let report = pipeline.on_build_done().await.unwrap();
        // minimal.md is a draft
        assert_eq!(report.processed, 2);
        assert_eq!(report.fallen_back, vec![Slug("semantic-html".to_string())]);

        let xml = read(tmp.path().join("public").join("rss").join("feed.xml"));
        assert_eq!(rss_item_titles(&xml), ["Semantic HTML", "What I learned: 20+ years of software development"]);
        assert!(xml.contains("https://thiagocafe.com/articles/what-i-learned/me.png"));
        assert!(xml.contains("<div class=\"callout warning\">"));
        assert!(xml.contains("<author>thiago@example.com (Thiago)</author>"));
        assert!(xml.contains("<category>career</category>"));
    }
}
