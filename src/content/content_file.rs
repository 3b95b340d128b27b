use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::content::frontmatter::{self, FrontmatterBlock};
use crate::content::parsing_utils::{extract_tags, parse_bool, unquote};
use crate::content::{ContentEntry, Slug};
use crate::error::DocumentError;
use crate::text_utils::parse_date_time;

pub struct ContentFile {
    pub slug: Slug,
    pub file_path: PathBuf,
    pub raw_content: String,
}

impl ContentFile {
    pub fn from_file(slug: Slug, file_path: PathBuf) -> Result<ContentFile, DocumentError> {
        let raw_content = match fs::read_to_string(&file_path) {
            Ok(content) => content,
            Err(source) => return Err(DocumentError::Read { path: file_path, source }),
        };

        Ok(ContentFile {
            slug,
            file_path,
            raw_content,
        })
    }

    /// Coerces the frontmatter into a typed entry. `default_author` is used
    /// when the document names none.
    pub fn to_entry(&self, default_author: &str) -> Result<ContentEntry, DocumentError> {
        let (block, body) = frontmatter::split(&self.raw_content);
        let Some(block) = block else {
            return Err(DocumentError::MissingFrontmatter);
        };

        let title = required(&block, "title")?;

        let date_value = field(&block, "publishDate").or_else(|| field(&block, "date"));
        let Some(date_value) = date_value else {
            return Err(DocumentError::MissingField("publishDate"));
        };
        let published = parse_date(date_value, "publishDate")?;

        let updated = match field(&block, "updatedDate") {
            Some(value) => Some(parse_date(value, "updatedDate")?),
            None => None,
        };

        let draft = match field(&block, "draft") {
            Some(value) => parse_bool(value).map_err(|reason| DocumentError::InvalidField { field: "draft", reason })?,
            None => false,
        };

        let tags = block.get("tags").map(extract_tags).unwrap_or_default();

        Ok(ContentEntry {
            slug: self.slug.clone(),
            title: title.to_string(),
            description: field(&block, "description").unwrap_or_default().to_string(),
            published,
            updated,
            author: field(&block, "author").unwrap_or(default_author).to_string(),
            tags,
            draft,
            body: body.to_string(),
            source: self.file_path.clone(),
        })
    }
}

fn field<'a>(block: &'a FrontmatterBlock, key: &str) -> Option<&'a str> {
    block.get(key).map(unquote).filter(|v| !v.is_empty())
}

fn required<'a>(block: &'a FrontmatterBlock, key: &'static str) -> Result<&'a str, DocumentError> {
    field(block, key).ok_or(DocumentError::MissingField(key))
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDateTime, DocumentError> {
    parse_date_time(value).map_err(|reason| DocumentError::InvalidField { field, reason })
}
