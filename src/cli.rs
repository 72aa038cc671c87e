use crate::orchestrator::ReplyStrategy;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "rss-notifier", about = "Feed update checker and social poster")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the feed for updates inside a trailing window and post each new
    /// entry with a reply thread of related table-of-contents entries.
    Post {
        /// Primary feed URL.
        rss_url: String,
        /// Detailed (table-of-contents) feed URL.
        toc_url: String,
        /// How many minutes back the window reaches.
        minutes: i64,
        /// How replies are grouped under each root post.
        #[arg(long, value_enum, default_value = "batched-category-reply")]
        strategy: ReplyStrategy,
        /// Static hashtag to append to every root post; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Viewer site linked from each root post.
        #[arg(long)]
        viewer_url: Option<String>,
        /// Log posts instead of submitting them.
        #[arg(long)]
        debug: bool,
    },
    /// Summarize one JST day of the detailed feed and post it as a single
    /// digest.
    Digest {
        /// Detailed (table-of-contents) feed URL.
        toc_url: String,
        /// Target day, YYYY-MM-DD (default: today in JST).
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Summarization model name.
        #[arg(long)]
        model: Option<String>,
        /// Static hashtag the summary should end with; repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Log posts instead of submitting them.
        #[arg(long)]
        debug: bool,
    },
}
