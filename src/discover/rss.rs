//! Minimal RSS 2.0 `<item>` reader over quick-xml's pull parser.
//!
//! Used by both the site-feed source and the Google News fallback. Only
//! the fields the pipeline consumes are collected; everything else is
//! skipped. A parse error mid-stream ends the scan, keeping whatever items
//! were complete before the error.
//!
//! Character data arrives fragmented: the reader emits a separate
//! `GeneralRef` event for every entity reference, so `First &amp; foremost`
//! is three events. Field values are accumulated across fragments and only
//! assigned at the closing tag.

use quick_xml::Reader;
use quick_xml::events::{BytesRef, Event};

#[derive(Debug, Default, Clone)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    pub description: Option<String>,
    pub pub_date: Option<String>,
}

enum Field {
    Title,
    Link,
    Guid,
    Description,
    PubDate,
}

/// Resolve a general entity reference to its text: character references
/// plus the five predefined XML entities. Unknown entities yield nothing.
pub(crate) fn resolve_general_ref(r: &BytesRef) -> Option<String> {
    if let Ok(Some(ch)) = r.resolve_char_ref() {
        return Some(ch.to_string());
    }
    match r.decode().ok()?.as_ref() {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "quot" => Some("\"".to_string()),
        "apos" => Some("'".to_string()),
        _ => None,
    }
}

/// Parse RSS/Atom-ish XML into its `<item>` elements.
pub fn parse_items(xml: &str) -> Vec<RssItem> {
    let mut reader = Reader::from_str(xml);

    let mut items = Vec::new();
    let mut current: Option<RssItem> = None;
    let mut field: Option<Field> = None;
    let mut buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                field = match e.local_name().as_ref() {
                    b"item" | b"entry" => {
                        current = Some(RssItem::default());
                        None
                    }
                    b"title" if current.is_some() => Some(Field::Title),
                    b"link" if current.is_some() => Some(Field::Link),
                    b"guid" | b"id" if current.is_some() => Some(Field::Guid),
                    b"description" | b"summary" if current.is_some() => Some(Field::Description),
                    b"pubDate" | b"updated" | b"published" if current.is_some() => {
                        Some(Field::PubDate)
                    }
                    _ => None,
                };
                buf.clear();
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"item" | b"entry" => {
                        if let Some(item) = current.take() {
                            items.push(item);
                        }
                        field = None;
                    }
                    _ => {
                        if let (Some(item), Some(f)) = (current.as_mut(), field.take()) {
                            assign(item, &f, buf.trim());
                        }
                    }
                }
                buf.clear();
            }
            Ok(Event::Text(t)) => {
                if field.is_some() {
                    if let Ok(text) = t.xml10_content() {
                        buf.push_str(&text);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if field.is_some() {
                    buf.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if field.is_some() {
                    if let Some(text) = resolve_general_ref(&r) {
                        buf.push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }

    items
}

fn assign(item: &mut RssItem, field: &Field, value: &str) {
    if value.is_empty() {
        return;
    }
    let slot = match field {
        Field::Title => &mut item.title,
        Field::Link => &mut item.link,
        Field::Guid => &mut item.guid,
        Field::Description => &mut item.description,
        Field::PubDate => &mut item.pub_date,
    };
    if slot.is_none() {
        *slot = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_channel() {
        let xml = r#"<?xml version="1.0"?>
        <rss version="2.0"><channel>
            <title>Channel title is not an item title</title>
            <item>
                <title>First &amp; foremost</title>
                <link>https://example.com/a</link>
                <guid isPermaLink="false">guid-1</guid>
                <description><![CDATA[Summary <b>one</b>]]></description>
                <pubDate>Wed, 01 May 2024 10:00:00 GMT</pubDate>
            </item>
            <item>
                <title>Second</title>
                <link>https://example.com/b</link>
            </item>
        </channel></rss>"#;

        let items = parse_items(xml);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("First & foremost"));
        assert_eq!(items[0].guid.as_deref(), Some("guid-1"));
        assert_eq!(items[0].description.as_deref(), Some("Summary <b>one</b>"));
        assert_eq!(
            items[0].pub_date.as_deref(),
            Some("Wed, 01 May 2024 10:00:00 GMT")
        );
        assert_eq!(items[1].link.as_deref(), Some("https://example.com/b"));
        assert!(items[1].pub_date.is_none());
    }

    #[test]
    fn test_entities_keep_surrounding_text_and_spacing() {
        let xml = r#"<rss><channel><item>
            <title>Fish &amp; chips &#8211; a review &lt;updated&gt;</title>
            <link>https://example.com/a?page=1&amp;lang=en</link>
        </item></channel></rss>"#;
        let items = parse_items(xml);
        assert_eq!(
            items[0].title.as_deref(),
            Some("Fish & chips \u{2013} a review <updated>")
        );
        assert_eq!(
            items[0].link.as_deref(),
            Some("https://example.com/a?page=1&lang=en")
        );
    }

    #[test]
    fn test_channel_fields_not_collected() {
        let xml = r#"<rss><channel><title>Chan</title><link>https://example.com</link>
            <item><title>Only</title></item></channel></rss>"#;
        let items = parse_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Only"));
        assert!(items[0].link.is_none());
    }

    #[test]
    fn test_malformed_keeps_complete_items() {
        let xml = r#"<rss><channel>
            <item><title>Done</title></item>
            <item><title>Broken"#;
        let items = parse_items(xml);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title.as_deref(), Some("Done"));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_items("").is_empty());
        assert!(parse_items("not xml at all").is_empty());
    }
}
