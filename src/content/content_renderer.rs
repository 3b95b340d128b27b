use std::sync::Arc;

use markdown::Options;
use spdlog::warn;

use crate::content::structured_renderer::StructuredLayer;
use crate::content::{ContentEntry, RenderStatus, RenderedItem};
use crate::error::EntryRenderError;

pub const PLACEHOLDER: &str = "Article content unavailable";

/// One attempt at turning an entry into HTML.
pub trait RenderLayer: Send + Sync {
    fn name(&self) -> &'static str;
    fn attempt(&self, entry: &ContentEntry, url: &str) -> Result<String, EntryRenderError>;
}

/// Plain GFM conversion of the raw body. Raw HTML in the body is escaped.
pub struct MarkdownLayer;

impl RenderLayer for MarkdownLayer {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn attempt(&self, entry: &ContentEntry, _url: &str) -> Result<String, EntryRenderError> {
        if entry.body.trim().is_empty() {
            return Err(EntryRenderError::EmptyBody);
        }
        match markdown::to_html_with_options(&entry.body, &Options::gfm()) {
            Ok(x) => Ok(x),
            Err(e) => Err(EntryRenderError::Markdown(e.to_string())),
        }
    }
}

pub struct DescriptionLayer;

impl RenderLayer for DescriptionLayer {
    fn name(&self) -> &'static str {
        "description"
    }

    fn attempt(&self, entry: &ContentEntry, _url: &str) -> Result<String, EntryRenderError> {
        if entry.description.trim().is_empty() {
            return Err(EntryRenderError::EmptyDescription);
        }
        Ok(entry.description.clone())
    }
}

pub struct PlaceholderLayer;

impl RenderLayer for PlaceholderLayer {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn attempt(&self, _entry: &ContentEntry, _url: &str) -> Result<String, EntryRenderError> {
        Ok(PLACEHOLDER.to_string())
    }
}

/// Tries its layers in order; the first one is the full render and every
/// later one is a fallback. The placeholder is always the last resort.
pub struct ContentRenderer {
    layers: Vec<Box<dyn RenderLayer>>,
}

impl Default for ContentRenderer {
    fn default() -> Self {
        ContentRenderer::with_layers(vec![
            Box::new(StructuredLayer),
            Box::new(MarkdownLayer),
            Box::new(DescriptionLayer),
        ])
    }
}

impl ContentRenderer {
    pub fn with_layers(layers: Vec<Box<dyn RenderLayer>>) -> Self {
        ContentRenderer { layers }
    }

    pub fn render(&self, entry: Arc<ContentEntry>, site_url: &str) -> RenderedItem {
        let url = article_url(site_url, &entry.slug.0);
        let mut fallback_reason: Option<String> = None;

        for (idx, layer) in self.layers.iter().enumerate() {
            match layer.attempt(&entry, &url) {
                Ok(content) if !content.is_empty() => {
                    let status = if idx == 0 { RenderStatus::Succeeded } else { RenderStatus::FallenBack };
                    return RenderedItem {
                        entry,
                        url,
                        content,
                        status,
                        layer: layer.name(),
                        fallback_reason,
                    };
                }
                Ok(_) => {
                    if idx == 0 {
                        fallback_reason = Some(format!("{} layer produced no content", layer.name()));
                    }
                }
                Err(e) => {
                    if idx == 0 {
                        warn!("Error rendering article {}: {}. Falling back", entry.slug, e);
                        fallback_reason = Some(e.to_string());
                    }
                }
            }
        }

        RenderedItem {
            entry,
            url,
            content: PLACEHOLDER.to_string(),
            status: RenderStatus::FallenBack,
            layer: PlaceholderLayer.name(),
            fallback_reason: fallback_reason.or_else(|| Some("no render layer configured".to_string())),
        }
    }
}

pub fn article_url(site_url: &str, slug: &str) -> String {
    format!("{}/articles/{}", site_url.trim_end_matches('/'), slug)
}
