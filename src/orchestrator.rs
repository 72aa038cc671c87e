use crate::compose::{self, MAX_POST_LENGTH};
use crate::correlate::{correlate, SubstringMatcher, TitleMatcher};
use crate::delta::{extract_between, extract_delta, jst_day_bounds, DeltaRecord};
use crate::fetcher::Fetcher;
use crate::output::RunOutcome;
use crate::packer::pack;
use crate::parser::parse_feed;
use crate::poster::PostApi;
use crate::retry::{with_retry, DEFAULT_MAX_ATTEMPTS};
use crate::summarizer::{build_digest_prompt, Summarizer};
use crate::types::{FeedEntry, FetchConfig, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

/// How replies to a root post are grouped under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReplyStrategy {
    /// One reply per correlated table-of-contents entry.
    DirectPerEntryReply,
    /// Per-entry fragments packed under the post length budget, one reply
    /// per sealed batch.
    BatchedCategoryReply,
    /// No per-entry threads; a single summarized post for the whole day.
    DailySummaryPost,
}

/// Everything a run needs, resolved up front. Debug short-circuiting and
/// inter-post pacing are explicit here instead of ambient lookups inside
/// the posting code.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub primary_url: String,
    pub toc_url: String,
    pub window_minutes: i64,
    pub strategy: ReplyStrategy,
    pub base_tags: Vec<String>,
    pub viewer_url: Option<String>,
    pub target_date: Option<NaiveDate>,
    pub model: String,
    pub debug: bool,
    pub reply_delay: Duration,
    pub entry_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            primary_url: String::new(),
            toc_url: String::new(),
            window_minutes: 60,
            strategy: ReplyStrategy::BatchedCategoryReply,
            base_tags: Vec::new(),
            viewer_url: None,
            target_date: None,
            model: crate::summarizer::DEFAULT_MODEL.to_string(),
            debug: false,
            reply_delay: Duration::from_secs(1),
            entry_delay: Duration::from_secs(2),
        }
    }
}

/// Drives one run end to end: window, delta, correlation, posting, outcome.
/// Strictly sequential; reply threading needs the root id before any reply
/// can go out.
pub struct Orchestrator {
    config: RunConfig,
    poster: Option<Box<dyn PostApi>>,
    summarizer: Option<Box<dyn Summarizer>>,
    matcher: Box<dyn TitleMatcher + Send + Sync>,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            poster: None,
            summarizer: None,
            matcher: Box::new(SubstringMatcher),
        }
    }

    pub fn with_poster(mut self, poster: Box<dyn PostApi>) -> Self {
        self.poster = Some(poster);
        self
    }

    pub fn with_summarizer(mut self, summarizer: Box<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    pub fn with_matcher(mut self, matcher: Box<dyn TitleMatcher + Send + Sync>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Fetch both feeds and run the posting sequence against them.
    pub async fn run(&self) -> Result<RunOutcome> {
        let fetcher = Fetcher::new(FetchConfig::default())?;

        if self.config.strategy == ReplyStrategy::DailySummaryPost {
            let toc_body = fetcher.fetch(&self.config.toc_url).await?;
            let toc_entries = parse_feed(&toc_body)?;
            return self.run_digest(toc_entries).await;
        }

        let primary_body = fetcher.fetch(&self.config.primary_url).await?;
        let primary_entries = parse_feed(&primary_body)?;

        let toc_body = fetcher.fetch(&self.config.toc_url).await?;
        let toc_entries = parse_feed(&toc_body)?;

        self.run_posts(primary_entries, toc_entries, Utc::now()).await
    }

    /// The windowed posting sequence, separated from fetching so it can be
    /// driven directly with prepared entries.
    pub async fn run_posts(
        &self,
        primary_entries: Vec<FeedEntry>,
        toc_entries: Vec<FeedEntry>,
        now: chrono::DateTime<Utc>,
    ) -> Result<RunOutcome> {
        let cutoff = now - ChronoDuration::minutes(self.config.window_minutes);
        info!(
            "Window: {} minutes back, entries since {}",
            self.config.window_minutes,
            cutoff.to_rfc3339()
        );

        let primary_delta = extract_delta(&primary_entries, cutoff);
        let toc_delta = extract_delta(&toc_entries, cutoff);
        info!(
            "Delta: {} primary entries, {} table-of-contents entries",
            primary_delta.len(),
            toc_delta.len()
        );

        let updated = !primary_delta.is_empty();

        if !updated {
            warn!("No feed updates inside the window");
            return Ok(RunOutcome::Posts {
                updated: false,
                entries: primary_delta,
            });
        }

        match &self.poster {
            Some(poster) => {
                for entry in &primary_delta {
                    self.post_entry_thread(poster.as_ref(), entry, &toc_delta).await;
                    tokio::time::sleep(self.config.entry_delay).await;
                }
            }
            None => {
                warn!("Posting credentials are not set, skipping posting");
            }
        }

        Ok(RunOutcome::Posts {
            updated,
            entries: primary_delta,
        })
    }

    /// Post one entry's root and its reply thread. A root failure abandons
    /// only this entry's thread; a reply failure skips just that reply.
    async fn post_entry_thread(
        &self,
        poster: &dyn PostApi,
        entry: &DeltaRecord,
        toc_delta: &[DeltaRecord],
    ) {
        let root_text = compose::root_post(
            entry,
            &self.config.base_tags,
            self.config.viewer_url.as_deref(),
        );
        info!("Posting: {}", entry.title);

        // Rate limits on the root are retried; exhaustion or any other
        // failure abandons this entry's thread only.
        let root_id = match with_retry(DEFAULT_MAX_ATTEMPTS, || poster.create_post(&root_text)).await
        {
            Ok(id) => id,
            Err(e) => {
                error!("Root post failed for '{}': {}", entry.title, e);
                return;
            }
        };

        let group = correlate(entry, toc_delta, self.matcher.as_ref());
        if group.related.is_empty() {
            return;
        }

        let replies: Vec<String> = match self.config.strategy {
            ReplyStrategy::DirectPerEntryReply => group
                .related
                .iter()
                .map(|toc| compose::dedupe_tags(&compose::reply_fragment(toc)))
                .collect(),
            ReplyStrategy::BatchedCategoryReply => {
                let fragments: Vec<String> = group
                    .related
                    .iter()
                    .map(|toc| compose::reply_fragment(toc))
                    .collect();
                pack(&fragments, MAX_POST_LENGTH)
                    .iter()
                    .map(|batch| compose::dedupe_tags(&batch.text()))
                    .collect()
            }
            ReplyStrategy::DailySummaryPost => Vec::new(),
        };

        for reply_text in replies {
            // Every reply chains to the root, one linear thread.
            if let Err(e) = poster.create_reply(&reply_text, &root_id).await {
                warn!("Reply failed for '{}': {}", entry.title, e);
            }
            tokio::time::sleep(self.config.reply_delay).await;
        }
    }

    /// The daily digest sequence: one JST day's entries, summarized through
    /// the retry scheduler, posted as a single root.
    pub async fn run_digest(&self, toc_entries: Vec<FeedEntry>) -> Result<RunOutcome> {
        let date = self
            .config
            .target_date
            .unwrap_or_else(|| (Utc::now() + ChronoDuration::hours(9)).date_naive());
        let (start, end) = jst_day_bounds(date);
        info!("Digest window: {} ({} to {})", date, start, end);

        let entries = extract_between(&toc_entries, start, end);
        info!("Entries for {}: {}", date, entries.len());

        if entries.is_empty() {
            warn!("No entries for the target day, skipping digest");
            return Ok(RunOutcome::Digest {
                updated: false,
                tweet_id: None,
                entries_count: 0,
            });
        }

        let summarizer = self
            .summarizer
            .as_ref()
            .ok_or(crate::types::NotifierError::MissingCredentials("GEMINI_API_KEY"))?;

        let prompt = build_digest_prompt(&entries, &self.config.base_tags);
        let summary = with_retry(DEFAULT_MAX_ATTEMPTS, || {
            summarizer.generate(&prompt, &self.config.model)
        })
        .await?;

        let text = compose::truncate_to_budget(&summary, MAX_POST_LENGTH);

        let tweet_id = match &self.poster {
            Some(poster) => match with_retry(DEFAULT_MAX_ATTEMPTS, || poster.create_post(&text)).await
            {
                Ok(id) => Some(id),
                Err(e) => {
                    error!("Digest post failed: {}", e);
                    None
                }
            },
            None => {
                warn!("Posting credentials are not set, skipping posting");
                None
            }
        };

        Ok(RunOutcome::Digest {
            updated: true,
            tweet_id,
            entries_count: entries.len(),
        })
    }
}
