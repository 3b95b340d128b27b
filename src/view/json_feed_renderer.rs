use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::SerializationError;
use crate::feed_model::{FeedAuthor, FeedItem, FeedModel};

const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: &'a str,
    description: &'a str,
    icon: &'a str,
    favicon: &'a str,
    language: &'a str,
    authors: Vec<JsonAuthor<'a>>,
    #[serde(rename = "_feed_links")]
    feed_links: JsonFeedLinks<'a>,
    items: Vec<JsonItem<'a>>,
}

#[derive(Serialize)]
struct JsonFeedLinks<'a> {
    rss2: &'a str,
    json: &'a str,
}

#[derive(Serialize)]
struct JsonAuthor<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Serialize)]
struct JsonItem<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    summary: &'a str,
    content_html: &'a str,
    date_published: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_modified: Option<String>,
    authors: Vec<JsonAuthor<'a>>,
    #[serde(skip_serializing_if = "no_tags")]
    tags: &'a [String],
}

impl<'a> From<&'a FeedAuthor> for JsonAuthor<'a> {
    fn from(author: &'a FeedAuthor) -> Self {
        JsonAuthor {
            name: author.name.as_str(),
            url: (!author.email.is_empty()).then(|| format!("mailto:{}", author.email)),
        }
    }
}

impl<'a> From<&'a FeedItem> for JsonItem<'a> {
    fn from(item: &'a FeedItem) -> Self {
        JsonItem {
            id: item.id.as_str(),
            url: item.link.as_str(),
            title: item.title.as_str(),
            summary: item.description.as_str(),
            content_html: item.content.as_str(),
            date_published: json_date(&item.published),
            date_modified: item.updated.as_ref().map(json_date),
            authors: vec![JsonAuthor::from(&item.author)],
            tags: &item.categories,
        }
    }
}

fn no_tags(tags: &&[String]) -> bool {
    tags.is_empty()
}

fn json_date(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn to_json_feed(model: &FeedModel) -> Result<Vec<u8>, SerializationError> {
    let feed = JsonFeed {
        version: JSON_FEED_VERSION,
        title: &model.title,
        home_page_url: &model.site_url,
        feed_url: &model.feed_links.json,
        description: &model.description,
        icon: &model.image,
        favicon: &model.favicon,
        language: &model.language,
        authors: vec![JsonAuthor::from(&model.author)],
        feed_links: JsonFeedLinks {
            rss2: &model.feed_links.rss2,
            json: &model.feed_links.json,
        },
        items: model.items.iter().map(JsonItem::from).collect(),
    };

    Ok(serde_json::to_vec_pretty(&feed)?)
}
