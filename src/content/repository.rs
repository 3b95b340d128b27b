use std::fs;
use std::path::{Path, PathBuf};

use spdlog::{debug, warn};

use crate::content::content_file::ContentFile;
use crate::content::{ContentEntry, Slug};
use crate::error::RepositoryError;

const EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// Read-only source of the content collection.
pub trait ContentRepository {
    fn entries(&self) -> Result<Vec<ContentEntry>, RepositoryError>;
}

impl ContentRepository for Vec<ContentEntry> {
    fn entries(&self) -> Result<Vec<ContentEntry>, RepositoryError> {
        Ok(self.clone())
    }
}

/// Loads articles from a directory. An article is either a file
/// `{slug}.md(x)` or a directory `{slug}/` holding `{index_base_name}.md(x)`.
pub struct FileRepository {
    pub content_dir: PathBuf,
    pub index_base_name: String,
    pub default_author: String,
}

impl FileRepository {
    pub fn new(content_dir: PathBuf, index_base_name: &str, default_author: &str) -> Self {
        FileRepository {
            content_dir,
            index_base_name: index_base_name.to_string(),
            default_author: default_author.to_string(),
        }
    }

    /// Lists (slug, document path) pairs sorted by path.
    pub fn list_documents(&self) -> Result<Vec<(Slug, PathBuf)>, RepositoryError> {
        let entries = match fs::read_dir(&self.content_dir) {
            Ok(entries) => entries,
            Err(source) => return Err(self.unreadable(source)),
        };

        let mut docs = vec![];
        for entry in entries {
            let entry = entry.map_err(|source| self.unreadable(source))?;
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();

            if file_type.is_dir() {
                if let Some(index_file) = self.find_index_file(&path) {
                    if let Some(slug) = file_name(&path) {
                        docs.push((Slug(slug), index_file));
                    }
                }
            } else if file_type.is_file() && has_content_extension(&path) {
                if let Some(slug) = path.file_stem().and_then(|s| s.to_str()) {
                    docs.push((Slug(slug.to_string()), path.clone()));
                }
            }
        }

        docs.sort_by(|(_, a), (_, b)| a.cmp(b));
        Ok(docs)
    }

    fn find_index_file(&self, dir: &Path) -> Option<PathBuf> {
        EXTENSIONS.iter()
            .map(|ext| dir.join(format!("{}.{}", self.index_base_name, ext)))
            .find(|path| path.is_file())
    }

    fn unreadable(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Unreadable {
            path: self.content_dir.clone(),
            source,
        }
    }
}

impl ContentRepository for FileRepository {
    fn entries(&self) -> Result<Vec<ContentEntry>, RepositoryError> {
        let mut entries = vec![];
        for (slug, path) in self.list_documents()? {
            let loaded = ContentFile::from_file(slug, path.clone())
                .and_then(|file| file.to_entry(&self.default_author));
            match loaded {
                Ok(entry) => {
                    debug!("Loaded article {} from {}", entry.slug, path.display());
                    entries.push(entry);
                }
                Err(e) => warn!("Rejecting content document {}: {}", path.display(), e),
            }
        }
        Ok(entries)
    }
}

fn has_content_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|s| s.to_str()).map(|s| s.to_string())
}
