use crate::types::{FeedEntry, NotifierError, Result};
use chrono::Utc;
use feed_rs::parser;
use tracing::{debug, info};

/// Parse a feed document into entries, preserving the feed's entry order.
///
/// Category terms keep their source order; that order flows all the way
/// through to hashtag emission. Entries without a link are dropped.
pub fn parse_feed(content: &str) -> Result<Vec<FeedEntry>> {
    debug!("Parsing feed content ({} bytes)", content.len());

    let feed = parser::parse(content.as_bytes())
        .map_err(|e| NotifierError::Parse(format!("Failed to parse feed: {}", e)))?;

    let mut entries = Vec::new();

    for entry in feed.entries {
        if let Some(parsed) = parse_entry(entry) {
            entries.push(parsed);
        }
    }

    info!("Parsed feed with {} entries", entries.len());

    Ok(entries)
}

fn parse_entry(entry: feed_rs::model::Entry) -> Option<FeedEntry> {
    let title = entry
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "Untitled".to_string());

    // The primary link; entries without one are not reportable.
    let link = entry.links.first()?.href.clone();

    let summary = entry.summary.map(|s| s.content).unwrap_or_default();

    // Longer-form body when the feed carries one separately from the summary.
    let description = entry.content.and_then(|c| c.body);

    let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));

    let categories = entry.categories.into_iter().map(|c| c.term).collect();

    Some(FeedEntry {
        title,
        link,
        summary,
        description,
        published_at,
        categories,
    })
}
