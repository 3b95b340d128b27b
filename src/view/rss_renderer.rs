use std::borrow::Cow;
use std::io::Cursor;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::SerializationError;
use crate::feed_model::{FeedAuthor, FeedModel};

/* Example
<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:atom="http://www.w3.org/2005/Atom">
<channel>
  <title>Thiago Cafe</title>
  <link>https://thiagocafe.com</link>
  <description>My blog feed</description>
  <lastBuildDate>Tue, 2 Jan 2024 05:06:07 +0000</lastBuildDate>
  <docs>https://validator.w3.org/feed/docs/rss2.html</docs>
  <generator>feedwright</generator>
  <language>en</language>
  <image>...</image>
  <copyright>All rights reserved 2025</copyright>
  <atom:link href="https://thiagocafe.com/rss/feed.xml" rel="self" type="application/rss+xml"/>
  <atom:link href="https://thiagocafe.com/rss/feed.json" rel="alternate" type="application/feed+json"/>
  <item>
    <title>What I learned after 20+ years of software development</title>
    <link>https://thiagocafe.com/articles/what-i-learned</link>
    <guid isPermaLink="true">https://thiagocafe.com/articles/what-i-learned</guid>
    <pubDate>Sat, 2 Apr 2022 12:05:00 +0000</pubDate>
    <description>How to be a great software engineer?</description>
    <content:encoded><![CDATA[<p>...</p>]]></content:encoded>
    <author>thiago@example.com (Thiago)</author>
    <category>career</category>
  </item>
</channel>
</rss>
*/

const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const RSS_DOCS: &str = "https://validator.w3.org/feed/docs/rss2.html";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub fn to_rss2(model: &FeedModel) -> Result<Vec<u8>, SerializationError> {
    Ok(render(model)?)
}

fn render(model: &FeedModel) -> quick_xml::Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let decl = Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None));
    writer.write_event(decl)?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:content", CONTENT_NS));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss))?;

    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    push_text(&mut writer, "title", &model.title)?;
    push_text(&mut writer, "link", &model.site_url)?;
    push_text(&mut writer, "description", &model.description)?;
    if let Some(generated_at) = model.generated_at {
        push_text(&mut writer, "lastBuildDate", &generated_at.to_rfc2822())?;
    }
    push_text(&mut writer, "docs", RSS_DOCS)?;
    push_text(&mut writer, "generator", &model.generator)?;
    push_text(&mut writer, "language", &model.language)?;

    writer.write_event(Event::Start(BytesStart::new("image")))?;
    push_text(&mut writer, "title", &model.title)?;
    push_text(&mut writer, "url", &model.image)?;
    push_text(&mut writer, "link", &model.site_url)?;
    writer.write_event(Event::End(BytesEnd::new("image")))?;

    push_text(&mut writer, "copyright", &model.copyright)?;

    push_atom_link(&mut writer, &model.feed_links.rss2, "self", "application/rss+xml")?;
    push_atom_link(&mut writer, &model.feed_links.json, "alternate", "application/feed+json")?;

    for item in &model.items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;

        push_text(&mut writer, "title", &item.title)?;
        push_text(&mut writer, "link", &item.link)?;

        let mut guid_elem = BytesStart::new("guid");
        guid_elem.push_attribute(("isPermaLink", if item.id == item.link { "true" } else { "false" }));
        writer.write_event(Event::Start(guid_elem))?;
        writer.write_event(Event::Text(BytesText::new(&xml_safe(&item.id))))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        push_text(&mut writer, "pubDate", &item.published.to_rfc2822())?;
        if !item.description.is_empty() {
            push_text(&mut writer, "description", &item.description)?;
        }
        push_cdata(&mut writer, "content:encoded", &item.content)?;
        push_text(&mut writer, "author", &rss_author(&item.author))?;
        for category in &item.categories {
            push_text(&mut writer, "category", category)?;
        }

        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(writer.into_inner().into_inner())
}

/// RSS wants `email (Name)`.
fn rss_author(author: &FeedAuthor) -> String {
    if author.email.is_empty() {
        author.name.clone()
    } else {
        format!("{} ({})", author.email, author.name)
    }
}

// Only tab, newline and carriage return are allowed below U+0020, and
// U+FFFE/U+FFFF are never allowed. Escaping can not represent them.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..)
}

fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| is_xml_char(*c)).collect())
    }
}

fn push_text(writer: &mut XmlWriter, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(&xml_safe(text))))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn push_atom_link(writer: &mut XmlWriter, href: &str, rel: &str, mime: &str) -> quick_xml::Result<()> {
    let mut link = BytesStart::new("atom:link");
    link.push_attribute(("href", &*xml_safe(href)));
    link.push_attribute(("rel", rel));
    link.push_attribute(("type", mime));
    writer.write_event(Event::Empty(link))?;
    Ok(())
}

// A "]]>" inside the text closes the section, so it is split across two
// CDATA sections: "]]" ends the first one and ">" starts the next.
fn push_cdata(writer: &mut XmlWriter, tag: &str, text: &str) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    let text = xml_safe(text);
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;
    for (idx, part) in parts.iter().enumerate() {
        let mut section = String::with_capacity(part.len() + 3);
        if idx > 0 {
            section.push('>');
        }
        section.push_str(part);
        if idx < last {
            section.push_str("]]");
        }
        writer.write_event(Event::CData(BytesCData::new(section)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str;

    use quick_xml::Reader;

    use crate::test_data::{feed_item, feed_model};

    use super::*;

    /// Parses the whole document, returning the number of items.
    fn count_items(xml: &str) -> usize {
        let mut reader = Reader::from_str(xml);
        let mut items = 0;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.name().as_ref() == b"item" => items += 1,
                Ok(Event::Eof) => break,
                Err(e) => panic!("invalid XML at {}: {:?}", reader.buffer_position(), e),
                _ => {}
            }
        }
        items
    }

    #[test]
    fn render_xml() {
        let model = feed_model(vec![feed_item("1")]);
        let xml = to_rss2(&model).unwrap();
        println!("XML: {}", str::from_utf8(&xml).unwrap());
        assert_eq!(str::from_utf8(&xml).unwrap(), EXPECTED);
    }

    #[test]
    fn render_is_deterministic() {
        let model = feed_model(vec![feed_item("1"), feed_item("2"), feed_item("3")]);
        assert_eq!(to_rss2(&model).unwrap(), to_rss2(&model).unwrap());
        assert_eq!(count_items(str::from_utf8(&to_rss2(&model).unwrap()).unwrap()), 3);
    }

    #[test]
    fn render_empty_feed() {
        let model = feed_model(vec![]);
        let xml = String::from_utf8(to_rss2(&model).unwrap()).unwrap();
        assert_eq!(count_items(&xml), 0);
        assert!(xml.contains("<language>en</language>"));
        assert!(xml.ends_with("</channel></rss>"));
        assert!(!xml.contains("lastBuildDate"));
    }

    #[test]
    fn render_escapes_text() {
        let mut item = feed_item("1");
        item.title = "Tom & Jerry <3".to_string();
        item.description = "a < b".to_string();
        item.categories = vec!["c&c".to_string()];
        let mut model = feed_model(vec![item]);
        model.title = "Me & You".to_string();

        let xml = String::from_utf8(to_rss2(&model).unwrap()).unwrap();
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;3</title>"));
        assert!(xml.contains("<description>a &lt; b</description>"));
        assert!(xml.contains("<category>c&amp;c</category>"));
        assert!(xml.contains("<title>Me &amp; You</title>"));
        assert_eq!(count_items(&xml), 1);
    }

    #[test]
    fn render_splits_cdata_terminator() {
        let mut item = feed_item("1");
        item.content = "<p>a]]>b</p>".to_string();
        let xml = String::from_utf8(to_rss2(&feed_model(vec![item])).unwrap()).unwrap();
        assert!(xml.contains("<content:encoded><![CDATA[<p>a]]]]><![CDATA[>b</p>]]></content:encoded>"));
        assert_eq!(count_items(&xml), 1);
    }

    #[test]
    fn render_strips_invalid_xml_chars() {
        let mut item = feed_item("1");
        item.title = "Bad\u{8}title".to_string();
        item.description = "tab\tkept\u{0}".to_string();
        item.content = "<p>form\u{C}feed \u{FFFF}ok</p>".to_string();
        item.categories = vec!["\u{1B}[31mred".to_string()];

        let xml = String::from_utf8(to_rss2(&feed_model(vec![item])).unwrap()).unwrap();
        assert!(xml.chars().all(is_xml_char));
        assert!(xml.contains("<title>Badtitle</title>"));
        assert!(xml.contains("<description>tab\tkept</description>"));
        assert!(xml.contains("<![CDATA[<p>formfeed ok</p>]]>"));
        assert!(xml.contains("<category>[31mred</category>"));
        assert_eq!(count_items(&xml), 1);
    }

    const EXPECTED: &str = r##"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:atom="http://www.w3.org/2005/Atom"><channel><title>Thiago Cafe</title><link>https://thiagocafe.com</link><description>My blog feed</description><lastBuildDate>Tue, 2 Jan 2024 05:06:07 +0000</lastBuildDate><docs>https://validator.w3.org/feed/docs/rss2.html</docs><generator>feedwright</generator><language>en</language><image><title>Thiago Cafe</title><url>https://thiagocafe.com/favicon.png</url><link>https://thiagocafe.com</link></image><copyright>All rights reserved 2025</copyright><atom:link href="https://thiagocafe.com/rss/feed.xml" rel="self" type="application/rss+xml"/><atom:link href="https://thiagocafe.com/rss/feed.json" rel="alternate" type="application/feed+json"/><item><title>title-of-post-1</title><link>https://thiagocafe.com/articles/post-1</link><guid isPermaLink="true">https://thiagocafe.com/articles/post-1</guid><pubDate>Tue, 2 Jan 2024 05:06:07 +0000</pubDate><description>summary-of-post-1</description><content:encoded><![CDATA[<p>content-of-post-1</p>]]></content:encoded><author>thiago@example.com (Thiago)</author></item></channel></rss>"##;
}
