use crate::types::FeedEntry;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

/// A feed entry that fell inside the run's window, restricted to the fields
/// the posting stages need. Lives for a single run; nothing is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaRecord {
    pub title: String,
    pub link: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "pubDate")]
    pub published: String,
    #[serde(skip)]
    pub published_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl DeltaRecord {
    fn from_entry(entry: &FeedEntry, published_at: DateTime<Utc>) -> Self {
        Self {
            title: entry.title.clone(),
            link: entry.link.clone(),
            summary: entry.summary.clone(),
            description: entry.description.clone(),
            published: published_at.format("%Y-%m-%d %H:%M:%S, GMT").to_string(),
            published_at,
            categories: entry.categories.clone(),
        }
    }
}

/// Select the entries published at or after `cutoff`, preserving feed order.
///
/// The boundary is inclusive so that abutting windows from consecutive runs
/// never drop an entry landing exactly on it; the matching duplicate-report
/// risk across adjacent windows is accepted. Entries without a publish
/// timestamp are skipped, not errors.
pub fn extract_delta(entries: &[FeedEntry], cutoff: DateTime<Utc>) -> Vec<DeltaRecord> {
    let mut delta = Vec::new();

    for entry in entries {
        let published_at = match entry.published_at {
            Some(dt) => dt,
            None => {
                debug!("Skipping undated entry: {}", entry.title);
                continue;
            }
        };

        if published_at >= cutoff {
            delta.push(DeltaRecord::from_entry(entry, published_at));
        }
    }

    delta
}

/// Select the entries published inside the half-open window `[start, end)`,
/// preserving feed order. Used by the daily digest, where the caller derives
/// the window from a calendar date.
pub fn extract_between(
    entries: &[FeedEntry],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<DeltaRecord> {
    let mut delta = Vec::new();

    for entry in entries {
        let published_at = match entry.published_at {
            Some(dt) => dt,
            None => continue,
        };

        if published_at >= start && published_at < end {
            delta.push(DeltaRecord::from_entry(entry, published_at));
        }
    }

    delta
}

/// UTC bounds of one JST calendar day.
pub fn jst_day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let jst = FixedOffset::east_opt(9 * 3600).expect("JST offset is valid");
    let start = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_local_timezone(jst)
        .single()
        .expect("fixed offset maps uniquely");
    let end = start + chrono::Duration::days(1);
    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}
