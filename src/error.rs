use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::content::Slug;
use crate::output_writer::WriteReport;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("site root URL is not configured")]
    MissingSiteUrl,
    #[error("site root URL must be absolute: {0}")]
    InvalidSiteUrl(String),
    #[error("required field `{0}` is missing from the site identity")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("could not read content directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A content document that can not become a [`crate::content::ContentEntry`].
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no frontmatter block found")]
    MissingFrontmatter,
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("invalid `{field}` value: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Failure of one render layer. Never escapes the renderer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryRenderError {
    #[error("body is empty")]
    EmptyBody,
    #[error("description is empty")]
    EmptyDescription,
    #[error("unterminated HTML comment in body")]
    UnterminatedComment,
    #[error("no renderer for component <{0}>")]
    MissingComponent(String),
    #[error("component <{0}> is never closed")]
    UnclosedComponent(String),
    #[error("markdown conversion failed: {0}")]
    Markdown(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntryProcessingError {
    #[error("title is empty")]
    EmptyTitle,
    #[error("slug `{0}` can not be used in a URL")]
    InvalidSlug(String),
    #[error("slug `{0}` is used by an earlier entry")]
    DuplicateSlug(String),
    #[error("{field} timestamp {value} is outside the supported year range")]
    TimestampOutOfRange { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("RSS serialization failed: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("JSON feed serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum OutputWriteError {
    #[error("could not create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("payload for {path} was not produced: {reason}")]
    MissingPayload { path: PathBuf, reason: String },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error("{selected} entries were selected but none could be processed (skipped: {})", join_slugs(.skipped))]
    NothingProcessed { selected: usize, skipped: Vec<Slug> },
    #[error("could not create output directory: {0}")]
    OutputDir(OutputWriteError),
    #[error("feed files were partially written: {0}")]
    Output(WriteReport),
    #[error("feed processing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn join_slugs(slugs: &[Slug]) -> String {
    slugs.iter().map(|s| s.0.as_str()).collect::<Vec<_>>().join(", ")
}
