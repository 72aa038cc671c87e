use crate::delta::DeltaRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// Width the platform assigns to any link, regardless of its real length.
pub const LINK_WIDTH: usize = 23;

/// Hard ceiling on the visible length of a single post.
pub const MAX_POST_LENGTH: usize = 280;

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z0-9+.-]*://\S+").expect("URL pattern is valid"));

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#\S+").expect("tag pattern is valid"));

/// Platform-visible length of `text`: every embedded link counts as a fixed
/// 23 units, everything else counts one unit per character (not per byte).
pub fn estimated_length(text: &str) -> usize {
    let mut length = 0;
    let mut last = 0;

    for m in URL_RE.find_iter(text) {
        length += text[last..m.start()].chars().count();
        length += LINK_WIDTH;
        last = m.end();
    }
    length += text[last..].chars().count();

    length
}

/// Strip inline hashtags from `text` and reattach them as a trailing block,
/// deduplicated in first-seen order, one tag per line, separated from the
/// body by exactly one blank line. Idempotent. Text without any tags is
/// returned with only the line cleanup applied.
pub fn dedupe_tags(text: &str) -> String {
    let mut tags: Vec<&str> = Vec::new();

    for line in text.lines() {
        for m in TAG_RE.find_iter(line) {
            let tag = m.as_str();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }

    let cleaned: Vec<String> = text
        .lines()
        .map(|line| TAG_RE.replace_all(line, "").trim_end().to_string())
        .collect();

    // Lines that held only tags collapse to empty; drop them off the tail.
    let mut end = cleaned.len();
    while end > 0 && cleaned[end - 1].is_empty() {
        end -= 1;
    }
    let body = cleaned[..end].join("\n");

    if tags.is_empty() {
        return body;
    }

    format!("{}\n\n{}", body, tags.join("\n"))
}

/// Root post text: title, link, the static hashtags, and an optional viewer
/// footer. The root never goes through tag deduplication.
pub fn root_post(entry: &DeltaRecord, base_tags: &[String], viewer_url: Option<&str>) -> String {
    let mut text = format!("{}\n{}", entry.title, entry.link);

    if let Some(url) = viewer_url {
        text.push('\n');
        text.push_str(url);
    }

    if !base_tags.is_empty() {
        text.push_str("\n\n");
        text.push_str(&base_tags.join(" "));
    }

    text
}

/// One reply fragment for a correlated table-of-contents entry: its title,
/// link, and category hashtags in source order.
pub fn reply_fragment(toc: &DeltaRecord) -> String {
    let tags: Vec<String> = toc.categories.iter().map(|c| format!("#{}", c)).collect();

    if tags.is_empty() {
        format!("{}\n{}", toc.title, toc.link)
    } else {
        format!("{}\n{}\n{}", toc.title, toc.link, tags.join(" "))
    }
}

/// Truncate `text` so its estimated length fits `budget`, appending an
/// ellipsis when anything was cut.
pub fn truncate_to_budget(text: &str, budget: usize) -> String {
    if estimated_length(text) <= budget {
        return text.to_string();
    }

    let mut out: String = text.chars().take(budget.saturating_sub(3)).collect();
    while estimated_length(&out) > budget.saturating_sub(3) {
        out.pop();
    }
    out.push_str("...");
    out
}
