use lazy_static::lazy_static;
use markdown::{CompileOptions, Options, ParseOptions};
use regex::Regex;

use crate::content::content_renderer::RenderLayer;
use crate::content::parsing_utils::{change_images, remove_comments};
use crate::content::ContentEntry;
use crate::error::EntryRenderError;

lazy_static! {
    static ref MODULE_STATEMENT: Regex = Regex::new(
        r#"^\s*(import\s+.+\s+from\s+['"][^'"]+['"]|import\s+['"][^'"]+['"]|export\s+(const|let|var|function|default)\b.*);?\s*$"#
    ).unwrap();
    static ref COMPONENT_TAG: Regex = Regex::new(r"<([A-Z][A-Za-z0-9]*)((?:\s[^<>]*)?/?)>").unwrap();
    static ref TYPE_ATTR: Regex = Regex::new(r#"\btype\s*=\s*["']([A-Za-z0-9_-]+)["']"#).unwrap();
}

/// Component-aware rendering of an article body written in markdown with
/// MDX extensions.
pub struct StructuredLayer;

impl RenderLayer for StructuredLayer {
    fn name(&self) -> &'static str {
        "structured"
    }

    fn attempt(&self, entry: &ContentEntry, url: &str) -> Result<String, EntryRenderError> {
        if entry.body.trim().is_empty() {
            return Err(EntryRenderError::EmptyBody);
        }

        // NUL is the code placeholder delimiter; markdown replaces it anyway
        let body = entry.body.replace(CODE_MARK, "\u{FFFD}");
        let masked = MaskedCode::new(&body);

        let buf = remove_comments(&masked.text)?;
        let buf = strip_module_statements(&buf);
        let buf = expand_components(&buf)?;
        let buf = change_images(url, &buf);
        let buf = masked.restore(&buf);

        markdown::to_html_with_options(&buf, &html_options())
            .map_err(|e| EntryRenderError::Markdown(e.to_string()))
    }
}

// Component expansions are raw HTML, so it has to be let through
fn html_options() -> Options {
    Options {
        parse: ParseOptions::gfm(),
        compile: CompileOptions {
            allow_dangerous_html: true,
            ..CompileOptions::gfm()
        },
    }
}

/// Splits markdown into (is_code, text) segments around fenced code blocks.
/// An unclosed fence runs to the end of the text.
fn split_fenced(text: &str) -> Vec<(bool, &str)> {
    let mut segments = vec![];
    let mut in_code = false;
    let mut start = 0;
    let mut pos = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let is_fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");
        if is_fence && !in_code {
            if pos > start {
                segments.push((false, &text[start..pos]));
            }
            start = pos;
            in_code = true;
        } else if is_fence {
            let end = pos + line.len();
            segments.push((true, &text[start..end]));
            start = end;
            in_code = false;
        }
        pos += line.len();
    }

    if start < text.len() {
        segments.push((in_code, &text[start..]));
    }
    segments
}

const CODE_MARK: char = '\0';

/// Markdown with every fenced block and inline code span replaced by a
/// `\0{n}\0` placeholder, so text rewrites never reach code.
struct MaskedCode {
    text: String,
    code: Vec<String>,
}

impl MaskedCode {
    fn new(body: &str) -> Self {
        let mut masked = MaskedCode { text: String::with_capacity(body.len()), code: vec![] };
        for (is_code, segment) in split_fenced(body) {
            if is_code {
                // The placeholder keeps the block on its own line
                match segment.strip_suffix('\n') {
                    Some(block) => {
                        masked.push_code(block);
                        masked.text.push('\n');
                    }
                    None => masked.push_code(segment),
                }
            } else {
                masked.mask_inline_code(segment);
            }
        }
        masked
    }

    fn push_code(&mut self, code: &str) {
        self.text.push(CODE_MARK);
        self.text.push_str(&self.code.len().to_string());
        self.text.push(CODE_MARK);
        self.code.push(code.to_string());
    }

    fn mask_inline_code(&mut self, text: &str) {
        let mut rest = text;
        while let Some(start) = rest.find('`') {
            let run = count_backticks(&rest[start..]);
            let after = &rest[start + run..];
            // A code span never crosses a blank line
            let paragraph = &after[..after.find("\n\n").unwrap_or(after.len())];
            match find_backtick_run(paragraph, run) {
                Some(end) => {
                    let span_end = start + run + end + run;
                    self.text.push_str(&rest[..start]);
                    self.push_code(&rest[start..span_end]);
                    rest = &rest[span_end..];
                }
                None => {
                    self.text.push_str(&rest[..start + run]);
                    rest = after;
                }
            }
        }
        self.text.push_str(rest);
    }

    fn restore(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for (idx, part) in text.split(CODE_MARK).enumerate() {
            if idx % 2 == 0 {
                out.push_str(part);
            } else if let Some(code) = part.parse::<usize>().ok().and_then(|n| self.code.get(n)) {
                out.push_str(code);
            }
        }
        out
    }
}

fn count_backticks(text: &str) -> usize {
    text.bytes().take_while(|b| *b == b'`').count()
}

/// Position of the next run of exactly `len` backticks.
fn find_backtick_run(text: &str, len: usize) -> Option<usize> {
    let mut pos = 0;
    while let Some(offset) = text[pos..].find('`') {
        let start = pos + offset;
        let run = count_backticks(&text[start..]);
        if run == len {
            return Some(start);
        }
        pos = start + run;
    }
    None
}

fn strip_module_statements(text: &str) -> String {
    text.split_inclusive('\n')
        .filter(|line| !MODULE_STATEMENT.is_match(line.trim_end()))
        .collect()
}

struct ComponentTag<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    attrs: &'a str,
    self_closing: bool,
}

fn find_component(text: &str) -> Option<ComponentTag<'_>> {
    let caps = COMPONENT_TAG.captures(text)?;
    let whole = caps.get(0)?;
    let attrs = caps.get(2).map(|a| a.as_str()).unwrap_or("");
    Some(ComponentTag {
        start: whole.start(),
        end: whole.end(),
        name: caps.get(1)?.as_str(),
        attrs: attrs.trim_end_matches('/'),
        self_closing: attrs.ends_with('/'),
    })
}

/// Range of the `</name>` closing the tag whose content starts `after`,
/// skipping over nested `<name>` pairs.
fn find_closing_tag(after: &str, name: &str) -> Option<(usize, usize)> {
    let close = format!("</{}>", name);
    let mut depth = 0;
    let mut pos = 0;
    loop {
        let close_at = pos + after[pos..].find(&close)?;
        depth += COMPONENT_TAG.captures_iter(&after[pos..close_at])
            .filter(|caps| &caps[1] == name && !caps[2].ends_with('/'))
            .count();
        if depth == 0 {
            return Some((close_at, close_at + close.len()));
        }
        depth -= 1;
        pos = close_at + close.len();
    }
}

/// Expands `<Callout>` (nested ones included). Code must already be masked.
fn expand_components(text: &str) -> Result<String, EntryRenderError> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(tag) = find_component(rest) {
        if tag.name != "Callout" {
            return Err(EntryRenderError::MissingComponent(tag.name.to_string()));
        }

        let kind = TYPE_ATTR.captures(tag.attrs)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .unwrap_or("info");

        out.push_str(&rest[..tag.start]);
        let after = &rest[tag.end..];
        let (children, remaining) = if tag.self_closing {
            ("", after)
        } else {
            match find_closing_tag(after, tag.name) {
                Some((start, end)) => (&after[..start], &after[end..]),
                None => return Err(EntryRenderError::UnclosedComponent(tag.name.to_string())),
            }
        };

        let children = expand_components(children.trim())?;
        out.push_str(&format!("<div class=\"callout {}\">\n\n{}\n\n</div>", kind, children));
        rest = remaining;
    }

    out.push_str(rest);
    Ok(out)
}
