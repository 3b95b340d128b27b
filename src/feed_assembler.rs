use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::config::SiteIdentity;
use crate::content::RenderedItem;
use crate::feed_model::{FeedAuthor, FeedItem, FeedLinks, FeedModel, FEED_DIR, JSON_FILE_NAME, RSS_FILE_NAME};

pub const GENERATOR: &str = concat!("feedwright ", env!("CARGO_PKG_VERSION"));

/// Builds the feed in the order of `items`. `now` only provides the
/// copyright year.
pub fn assemble(items: &[RenderedItem], site: &SiteIdentity, now: DateTime<Utc>) -> FeedModel {
    let site_url = site.site_url.trim_end_matches('/');

    let items: Vec<FeedItem> = items.iter().map(|item| to_feed_item(item, site)).collect();

    let generated_at = items.iter()
        .map(|item| item.updated.map_or(item.published, |updated| updated.max(item.published)))
        .max();

    FeedModel {
        title: site.title.clone(),
        description: site.description.clone(),
        site_url: site_url.to_string(),
        language: site.language.clone(),
        image: format!("{}/favicon.png", site_url),
        favicon: format!("{}/favicon.png", site_url),
        author: site.author.clone(),
        copyright: format!("All rights reserved {}", now.year()),
        generator: GENERATOR.to_string(),
        generated_at,
        feed_links: FeedLinks {
            rss2: format!("{}/{}/{}", site_url, FEED_DIR, RSS_FILE_NAME),
            json: format!("{}/{}/{}", site_url, FEED_DIR, JSON_FILE_NAME),
        },
        items,
    }
}

fn to_feed_item(item: &RenderedItem, site: &SiteIdentity) -> FeedItem {
    let entry = &item.entry;
    FeedItem {
        title: entry.title.clone(),
        id: item.url.clone(),
        link: item.url.clone(),
        description: entry.description.clone(),
        content: item.content.clone(),
        author: FeedAuthor {
            name: entry.author.clone(),
            email: site.author.email.clone(),
        },
        published: Utc.from_utc_datetime(&entry.published),
        updated: entry.updated.map(|dt| Utc.from_utc_datetime(&dt)),
        categories: entry.tags.clone(),
    }
}
