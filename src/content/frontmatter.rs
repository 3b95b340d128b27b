/* Example
---
title: What I learned after 20+ years of software development
publishDate: 2022-04-02
tags: [career, programming]
---

How to be a great software engineer?
*/

const DELIMITER: &str = "---";

/// Raw key/value pairs of a frontmatter header, in the order the keys first
/// appeared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontmatterBlock {
    entries: Vec<(String, String)>,
}

impl FrontmatterBlock {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: &str, value: &str) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.entries.push((key.to_string(), value.to_string())),
        }
    }
}

pub fn parse(text: &str) -> Option<FrontmatterBlock> {
    split(text).0
}

/// Splits `text` into its frontmatter block and the body that follows the
/// closing delimiter. Without a block the whole text is the body.
pub fn split(text: &str) -> (Option<FrontmatterBlock>, &str) {
    let trimmed = text.strip_prefix('\u{feff}').unwrap_or(text).trim_start();
    let Some(rest) = strip_delimiter_line(trimmed) else {
        return (None, text);
    };

    let mut block = FrontmatterBlock::default();
    let mut remaining = rest;
    loop {
        if remaining.is_empty() {
            // No closing delimiter
            return (None, text);
        }

        let (line, next) = match remaining.find('\n') {
            Some(pos) => (&remaining[..pos], &remaining[pos + 1..]),
            None => (remaining, ""),
        };

        if is_delimiter(line) {
            return (Some(block), next);
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                block.insert(key, value.trim());
            }
        }
        remaining = next;
    }
}

fn strip_delimiter_line(text: &str) -> Option<&str> {
    let (first, rest) = match text.find('\n') {
        Some(pos) => (&text[..pos], &text[pos + 1..]),
        None => (text, ""),
    };
    if is_delimiter(first) {
        Some(rest)
    } else {
        None
    }
}

fn is_delimiter(line: &str) -> bool {
    line.strip_suffix('\r').unwrap_or(line) == DELIMITER
}
