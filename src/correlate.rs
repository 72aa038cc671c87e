use crate::delta::DeltaRecord;
use tracing::debug;

/// Decides whether a secondary entry's summary refers to a primary title.
///
/// The default is literal substring containment, which is what the upstream
/// feeds are built around. It is fragile against title truncation or
/// re-encoding between feeds; keeping it behind a trait lets a stricter
/// matcher slot in without touching the correlation pass.
pub trait TitleMatcher {
    fn matches(&self, title: &str, summary: &str) -> bool;
}

/// Exact, case-sensitive containment.
pub struct SubstringMatcher;

impl TitleMatcher for SubstringMatcher {
    fn matches(&self, title: &str, summary: &str) -> bool {
        summary.contains(title)
    }
}

/// One primary entry together with the secondary entries that reference it.
/// Borrows both sides; feed content is never copied here.
pub struct CorrelatedGroup<'a> {
    pub entry: &'a DeltaRecord,
    pub related: Vec<&'a DeltaRecord>,
}

/// Scan the secondary delta in order and collect every entry whose summary
/// contains the primary's title. An empty match set is a valid outcome, and
/// a secondary entry is free to match more than one primary.
pub fn correlate<'a>(
    primary: &'a DeltaRecord,
    secondary: &'a [DeltaRecord],
    matcher: &dyn TitleMatcher,
) -> CorrelatedGroup<'a> {
    let related: Vec<&DeltaRecord> = secondary
        .iter()
        .filter(|toc| matcher.matches(&primary.title, &toc.summary))
        .collect();

    debug!("{} related entries for '{}'", related.len(), primary.title);

    CorrelatedGroup {
        entry: primary,
        related,
    }
}
