use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rss_notifier::orchestrator::{Orchestrator, ReplyStrategy, RunConfig};
use rss_notifier::output::RunOutcome;
use rss_notifier::poster::PostApi;
use rss_notifier::summarizer::Summarizer;
use rss_notifier::types::{FeedEntry, NotifierError, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

#[derive(Clone, Default)]
struct RecordingPoster {
    // (text, parent id) per submitted post, roots first come first.
    posts: Arc<Mutex<Vec<(String, Option<String>)>>>,
    fail_roots: bool,
    counter: Arc<AtomicU32>,
}

impl RecordingPoster {
    fn failing_roots() -> Self {
        Self {
            fail_roots: true,
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<(String, Option<String>)> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostApi for RecordingPoster {
    async fn create_post(&self, text: &str) -> Result<String> {
        if self.fail_roots {
            return Err(NotifierError::Post("simulated API error".to_string()));
        }
        let id = format!("id-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.posts.lock().unwrap().push((text.to_string(), None));
        Ok(id)
    }

    async fn create_reply(&self, text: &str, parent_id: &str) -> Result<String> {
        let id = format!("id-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.posts
            .lock()
            .unwrap()
            .push((text.to_string(), Some(parent_id.to_string())));
        Ok(id)
    }
}

struct FixedSummarizer {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl Summarizer for FixedSummarizer {
    async fn generate(&self, _prompt: &str, _model: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("Today's bulletins: one notice issued. #Gazette".to_string())
    }
}

fn test_config() -> RunConfig {
    RunConfig {
        window_minutes: 10,
        reply_delay: StdDuration::ZERO,
        entry_delay: StdDuration::ZERO,
        ..RunConfig::default()
    }
}

fn primary_entry(title: &str, minutes_ago: i64, now: chrono::DateTime<Utc>) -> FeedEntry {
    FeedEntry {
        title: title.to_string(),
        link: format!("https://example.com/{}", title.replace(' ', "-")),
        summary: String::new(),
        description: None,
        published_at: Some(now - Duration::minutes(minutes_ago)),
        categories: Vec::new(),
    }
}

fn toc_entry(summary: &str, categories: Vec<&str>, now: chrono::DateTime<Utc>) -> FeedEntry {
    FeedEntry {
        title: "Table of contents".to_string(),
        link: "https://example.com/toc".to_string(),
        summary: summary.to_string(),
        description: None,
        published_at: Some(now - Duration::minutes(1)),
        categories: categories.into_iter().map(String::from).collect(),
    }
}

#[tokio::test]
async fn new_entry_gets_a_root_post_and_a_category_reply() {
    let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
    let poster = RecordingPoster::default();
    let orchestrator =
        Orchestrator::new(test_config()).with_poster(Box::new(poster.clone()));

    let primary = vec![primary_entry("Notice 100", 2, now)];
    let toc = vec![toc_entry("Contents: Notice 100 and more", vec!["Tax", "Finance"], now)];

    let outcome = orchestrator.run_posts(primary, toc, now).await.unwrap();

    match outcome {
        RunOutcome::Posts { updated, entries } => {
            assert!(updated);
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].title, "Notice 100");
        }
        _ => panic!("expected a posts outcome"),
    }

    let posts = poster.recorded();
    assert_eq!(posts.len(), 2);

    let (root_text, root_parent) = &posts[0];
    assert!(root_parent.is_none());
    assert!(root_text.contains("Notice 100"));
    assert!(root_text.contains("https://example.com/Notice-100"));

    let (reply_text, reply_parent) = &posts[1];
    assert_eq!(reply_parent.as_deref(), Some("id-1"));
    let tax = reply_text.find("#Tax").expect("reply carries the Tax tag");
    let finance = reply_text.find("#Finance").expect("reply carries the Finance tag");
    assert!(tax < finance, "category order must be preserved");
}

#[tokio::test]
async fn quiet_window_posts_nothing_and_reports_no_update() {
    let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
    let poster = RecordingPoster::default();
    let orchestrator =
        Orchestrator::new(test_config()).with_poster(Box::new(poster.clone()));

    let primary = vec![primary_entry("Old notice", 120, now)];
    let toc = Vec::new();

    let outcome = orchestrator.run_posts(primary, toc, now).await.unwrap();

    match outcome {
        RunOutcome::Posts { updated, entries } => {
            assert!(!updated);
            assert!(entries.is_empty());
        }
        _ => panic!("expected a posts outcome"),
    }

    assert!(poster.recorded().is_empty());
}

#[tokio::test]
async fn root_failure_skips_the_thread_but_not_the_run() {
    let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
    let poster = RecordingPoster::failing_roots();
    let orchestrator =
        Orchestrator::new(test_config()).with_poster(Box::new(poster.clone()));

    let primary = vec![
        primary_entry("Notice 100", 2, now),
        primary_entry("Notice 101", 3, now),
    ];
    let toc = vec![toc_entry("Contents: Notice 100", vec!["Tax"], now)];

    let outcome = orchestrator.run_posts(primary, toc, now).await.unwrap();

    // Extraction is independent of posting success.
    match outcome {
        RunOutcome::Posts { updated, entries } => {
            assert!(updated);
            assert_eq!(entries.len(), 2);
        }
        _ => panic!("expected a posts outcome"),
    }

    // No root succeeded, so no reply was ever attempted.
    assert!(poster.recorded().is_empty());
}

#[tokio::test]
async fn missing_credentials_still_emit_the_outcome() {
    let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
    let orchestrator = Orchestrator::new(test_config());

    let primary = vec![primary_entry("Notice 100", 2, now)];

    let outcome = orchestrator.run_posts(primary, Vec::new(), now).await.unwrap();

    match outcome {
        RunOutcome::Posts { updated, entries } => {
            assert!(updated);
            assert_eq!(entries.len(), 1);
        }
        _ => panic!("expected a posts outcome"),
    }
}

#[tokio::test]
async fn direct_strategy_posts_one_reply_per_related_entry() {
    let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();
    let poster = RecordingPoster::default();
    let config = RunConfig {
        strategy: ReplyStrategy::DirectPerEntryReply,
        ..test_config()
    };
    let orchestrator = Orchestrator::new(config).with_poster(Box::new(poster.clone()));

    let primary = vec![primary_entry("Notice 100", 2, now)];
    let toc = vec![
        toc_entry("First mention of Notice 100", vec!["Tax"], now),
        toc_entry("Second mention of Notice 100", vec!["Finance"], now),
    ];

    orchestrator.run_posts(primary, toc, now).await.unwrap();

    let posts = poster.recorded();
    assert_eq!(posts.len(), 3);
    // Both replies chain to the root, a single linear thread.
    assert_eq!(posts[1].1.as_deref(), Some("id-1"));
    assert_eq!(posts[2].1.as_deref(), Some("id-1"));
}

#[tokio::test]
async fn digest_summarizes_the_target_day_and_posts_once() {
    let date = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let inside = Utc.with_ymd_and_hms(2025, 7, 15, 1, 0, 0).unwrap();
    let outside = Utc.with_ymd_and_hms(2025, 7, 13, 1, 0, 0).unwrap();

    let poster = RecordingPoster::default();
    let calls = Arc::new(AtomicU32::new(0));
    let config = RunConfig {
        strategy: ReplyStrategy::DailySummaryPost,
        target_date: Some(date),
        ..test_config()
    };
    let orchestrator = Orchestrator::new(config)
        .with_poster(Box::new(poster.clone()))
        .with_summarizer(Box::new(FixedSummarizer { calls: calls.clone() }));

    let mut in_day = toc_entry("Contents for the day", vec!["Tax"], inside);
    in_day.published_at = Some(inside);
    let mut out_of_day = toc_entry("Stale contents", vec![], outside);
    out_of_day.published_at = Some(outside);

    let outcome = orchestrator.run_digest(vec![in_day, out_of_day]).await.unwrap();

    match outcome {
        RunOutcome::Digest {
            updated,
            tweet_id,
            entries_count,
        } => {
            assert!(updated);
            assert_eq!(tweet_id.as_deref(), Some("id-1"));
            assert_eq!(entries_count, 1);
        }
        _ => panic!("expected a digest outcome"),
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(poster.recorded().len(), 1);
}

#[tokio::test]
async fn digest_with_no_entries_skips_summarization() {
    let date = NaiveDate::from_ymd_opt(2025, 7, 15).unwrap();
    let poster = RecordingPoster::default();
    let calls = Arc::new(AtomicU32::new(0));
    let config = RunConfig {
        strategy: ReplyStrategy::DailySummaryPost,
        target_date: Some(date),
        ..test_config()
    };
    let orchestrator = Orchestrator::new(config)
        .with_poster(Box::new(poster.clone()))
        .with_summarizer(Box::new(FixedSummarizer { calls: calls.clone() }));

    let outcome = orchestrator.run_digest(Vec::new()).await.unwrap();

    match outcome {
        RunOutcome::Digest {
            updated,
            entries_count,
            ..
        } => {
            assert!(!updated);
            assert_eq!(entries_count, 0);
        }
        _ => panic!("expected a digest outcome"),
    }

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(poster.recorded().is_empty());
}
