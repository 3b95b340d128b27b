use crate::content::ContentEntry;

/// Drops drafts unless `include_drafts` is set and orders the rest newest
/// first. Entries sharing a timestamp keep their input order.
pub fn select(entries: Vec<ContentEntry>, include_drafts: bool) -> Vec<ContentEntry> {
    let mut selected: Vec<ContentEntry> = if include_drafts {
        entries
    } else {
        entries.into_iter().filter(|entry| !entry.draft).collect()
    };

    // sort_by is stable
    selected.sort_by(|a, b| b.published.cmp(&a.published));
    selected
}

pub fn select_limited(entries: Vec<ContentEntry>, limit: usize, include_drafts: bool) -> Vec<ContentEntry> {
    let mut selected = select(entries, include_drafts);
    selected.truncate(limit);
    selected
}

/// Keeps entries carrying at least one of `tags`. No tags means no filter.
pub fn filter_by_tags(entries: Vec<ContentEntry>, tags: &[String]) -> Vec<ContentEntry> {
    if tags.is_empty() {
        return entries;
    }
    entries.into_iter()
        .filter(|entry| entry.tags.iter().any(|tag| tags.contains(tag)))
        .collect()
}
