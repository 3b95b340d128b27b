use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::feed_model::FeedAuthor;

#[derive(Deserialize, Default)]
pub struct Site {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct Paths {
    pub content_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Deserialize, Default)]
pub struct Defaults {
    pub index_base_name: Option<String>,
    #[serde(default)]
    pub include_drafts: bool,
    pub item_limit: Option<usize>,
    /// Only articles carrying at least one of these tags. Empty means all.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: Site,
    #[serde(default)]
    pub author: Author,
    pub paths: Paths,
    #[serde(default)]
    pub defaults: Defaults,
    pub log: Option<Log>,
}

/// Validated site configuration used to assemble the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteIdentity {
    pub site_url: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub author: FeedAuthor,
}

impl Config {
    pub fn site_identity(&self) -> Result<SiteIdentity, ConfigurationError> {
        let site_url = match self.site.url.as_deref().map(str::trim) {
            None | Some("") => return Err(ConfigurationError::MissingSiteUrl),
            Some(url) => url,
        };

        match url::Url::parse(site_url) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            _ => return Err(ConfigurationError::InvalidSiteUrl(site_url.to_string())),
        }

        Ok(SiteIdentity {
            site_url: site_url.trim_end_matches('/').to_string(),
            title: required(&self.site.title, "site.title")?,
            description: required(&self.site.description, "site.description")?,
            language: self.site.language.clone().unwrap_or_else(|| "en".to_string()),
            author: FeedAuthor {
                name: required(&self.author.name, "author.name")?,
                email: required(&self.author.email, "author.email")?,
            },
        })
    }

    pub fn index_base_name(&self) -> &str {
        self.defaults.index_base_name.as_deref().unwrap_or("index")
    }

    /// Directory receiving `feed.xml` and `feed.json`.
    pub fn feed_dir(&self) -> PathBuf {
        self.paths.output_dir.join(crate::feed_model::FEED_DIR)
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, ConfigurationError> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigurationError::MissingField(field)),
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = env::current_exe().ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match (exe_dir, path.strip_prefix("${exe_dir}")) {
        (Some(exe_dir), Ok(rest)) => exe_dir.join(rest),
        _ => path,
    }
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        content_dir: parse_path(cfg.paths.content_dir),
        output_dir: parse_path(cfg.paths.output_dir),
    };

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}
