use crate::error::EntryRenderError;

/// Removes one pair of matching surrounding quotes.
pub fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Accepts `[a, "b"]` as well as `a, b`. Duplicates are dropped, first one kept.
pub fn extract_tags(tags_str: &str) -> Vec<String> {
    let tags_str = tags_str.trim();
    let tags_str = tags_str
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(tags_str);

    let mut tags: Vec<String> = vec![];
    for tag in tags_str.split(',').map(unquote).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub fn parse_bool(value: &str) -> Result<bool, String> {
    match unquote(value) {
        "true" => Ok(true),
        "false" => Ok(false),
        x => Err(format!("expected true or false, found {}", x)),
    }
}

pub fn remove_comments(md_post: &str) -> Result<String, EntryRenderError> {
    let mut res: String = String::new();
    let mut slice = Some(md_post);

    let start_comment = "<!--";
    let end_comment = "-->";

    while let Some(block) = slice {
        let md_buf: &str = match block.find(start_comment) {
            Some(start) => {
                let to_render: &str = &block[0..start];

                let next: &str = &block[(start + start_comment.len())..];
                match next.find(end_comment) {
                    Some(end) => {
                        slice = Some(&next[(end + end_comment.len())..]);
                    }
                    None => return Err(EntryRenderError::UnterminatedComment),
                };

                to_render
            }
            None => {
                slice = None;
                block
            }
        };
        res.push_str(md_buf);
    }

    Ok(res)
}

/// Prefixes relative markdown image links with `prefix`. Absolute and
/// root-relative links are left alone.
pub fn change_images(prefix: &str, md_post: &str) -> String {
    let mut parsed_string = String::new();
    let mut remaining_input = md_post;

    while let Some(text_start) = remaining_input.find("![") {
        let text_end = text_start + 2;

        // Append the text before the ![ pattern
        parsed_string.push_str(&remaining_input[0..text_end]);
        remaining_input = &remaining_input[text_end..];

        // Look for the closing bracket of the link text
        if let Some(link_end) = remaining_input.find("](") {
            let link_text = &remaining_input[..link_end];
            let url_start = link_end + 2; // For ](

            let url_start_slice = &remaining_input[url_start..];
            if let Some(url_end) = url_start_slice.find(')') {
                let url = &url_start_slice[..url_end];
                let prefixed_url = if url.contains("://") || url.starts_with('/') {
                    url.to_string()
                } else if prefix.ends_with('/') {
                    format!("{}{}", prefix, url)
                } else {
                    format!("{}/{}", prefix, url)
                };

                parsed_string.push_str(link_text);
                parsed_string.push_str("](");
                parsed_string.push_str(&prefixed_url);
                parsed_string.push(')');

                remaining_input = &url_start_slice[url_end + 1..];
            }
        }
    }

    // Append any remaining text after the last pattern
    parsed_string.push_str(remaining_input);

    parsed_string
}
