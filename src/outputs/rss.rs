//! RSS 2.0 mirror of the JSON snapshot.

use std::error::Error;
use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tokio::fs;
use tracing::{info, instrument};

use crate::models::Article;
use crate::normalize::parse_date;
use crate::sites::SiteConfig;

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), Box<dyn Error>> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn channel_link(site: &SiteConfig) -> String {
    site.entry_pages
        .first()
        .map(|p| (*p).to_string())
        .unwrap_or_else(|| format!("https://www.{}/", site.host))
}

/// Render the merged articles as an RSS 2.0 document.
pub fn render(site: &SiteConfig, items: &[Article]) -> Result<String, Box<dyn Error>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    text_element(
        &mut writer,
        "title",
        &format!("{} - Aggregated (Unofficial)", site.source_name),
    )?;
    text_element(&mut writer, "link", &channel_link(site))?;
    text_element(
        &mut writer,
        "description",
        "Auto-generated (headings and summaries only).",
    )?;
    text_element(&mut writer, "language", site.feed_language)?;

    for article in items {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        let mut guid = BytesStart::new("guid");
        guid.push_attribute(("isPermaLink", "false"));
        writer.write_event(Event::Start(guid))?;
        writer.write_event(Event::Text(BytesText::new(&article.id)))?;
        writer.write_event(Event::End(BytesEnd::new("guid")))?;

        text_element(&mut writer, "title", &article.title)?;
        text_element(&mut writer, "link", &article.link)?;
        text_element(
            &mut writer,
            "description",
            article.summary.as_deref().unwrap_or(&article.title),
        )?;
        if let Some(dt) = article.published_at.as_deref().and_then(parse_date) {
            text_element(&mut writer, "pubDate", &dt.to_rfc2822())?;
        }
        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(writer.into_inner().into_inner())?)
}

/// Write the RSS mirror to `<out_dir>/<stem>.xml`.
#[instrument(level = "info", skip(items), fields(site = site.key))]
pub async fn write_feed(
    site: &SiteConfig,
    items: &[Article],
    out_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let xml = render(site, items)?;
    let path = format!("{}/{}.xml", out_dir, site.output_stem);
    fs::write(&path, xml).await?;
    info!(path = %path, count = items.len(), "Wrote RSS mirror");
    Ok(path)
}
