#[cfg(test)]
pub const ARTICLE_MDX: &str = r#"---
title: "What I learned: 20+ years of software development"
description: How to be a great software engineer?
publishDate: 2022-04-02 12:05:00.000
updatedDate: 2022-05-01
author: Thiago
tags: [career, programming]
draft: false
---
import Callout from '../components/Callout.astro';

Someone asked me this question today and I didn't have an answer.

<!-- more -->

<Callout type="warning">
I don't think I am a great engineer.
</Callout>

## Non technical

![portrait](me.png)

__The earlier you find that, the better.__
"#;

#[cfg(test)]
pub const ARTICLE_MINIMAL: &str = "---
title: Minimal
date: 2024-01-01
draft: true
---
Short body
";

#[cfg(test)]
pub const ARTICLE_UNKNOWN_COMPONENT: &str = r#"---
title: Semantic HTML
description: Unlocking a11y with semantic HTML
date: 2023-06-10
---
import GoodTextSemantics from './GoodTextSemantics.jsx';

Good text semantics look like this:

<GoodTextSemantics client:load />
"#;

#[cfg(test)]
pub fn site_identity() -> crate::config::SiteIdentity {
    crate::config::SiteIdentity {
        site_url: "https://thiagocafe.com".to_string(),
        title: "Thiago Cafe".to_string(),
        description: "My blog feed".to_string(),
        language: "en".to_string(),
        author: crate::feed_model::FeedAuthor {
            name: "Thiago".to_string(),
            email: "thiago@example.com".to_string(),
        },
    }
}

#[cfg(test)]
pub fn feed_item(id: &str) -> crate::feed_model::FeedItem {
    use chrono::{TimeZone, Utc};

    let link = format!("https://thiagocafe.com/articles/post-{}", id);
    crate::feed_model::FeedItem {
        title: format!("title-of-post-{}", id),
        id: link.clone(),
        link,
        description: format!("summary-of-post-{}", id),
        content: format!("<p>content-of-post-{}</p>", id),
        author: crate::feed_model::FeedAuthor {
            name: "Thiago".to_string(),
            email: "thiago@example.com".to_string(),
        },
        published: Utc.with_ymd_and_hms(2024, 1, 2, 5, 6, 7).unwrap(),
        updated: None,
        categories: vec![],
    }
}

#[cfg(test)]
pub fn feed_model(items: Vec<crate::feed_model::FeedItem>) -> crate::feed_model::FeedModel {
    use chrono::{TimeZone, Utc};

    let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let mut model = crate::feed_assembler::assemble(&[], &site_identity(), now);
    model.generated_at = items.iter().map(|i| i.published).max();
    model.generator = "feedwright".to_string();
    model.items = items;
    model
}
