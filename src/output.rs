use crate::delta::DeltaRecord;
use crate::types::Result;
use serde_json::json;
use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::info;

/// Machine-readable result of one run, handed to the CI output file when the
/// `GITHUB_OUTPUT` variable names one, otherwise printed to stdout as JSON.
pub enum RunOutcome {
    /// Per-entry posting run: the update flag and the extracted entries.
    Posts {
        updated: bool,
        entries: Vec<DeltaRecord>,
    },
    /// Daily digest run: the posted id (if posting happened) and how many
    /// entries fed the summary.
    Digest {
        updated: bool,
        tweet_id: Option<String>,
        entries_count: usize,
    },
}

pub fn emit(outcome: &RunOutcome) -> Result<()> {
    match env::var("GITHUB_OUTPUT") {
        Ok(path) => {
            info!("Writing run outcome to {}", path);
            let mut file = OpenOptions::new().append(true).create(true).open(path)?;
            match outcome {
                RunOutcome::Posts { updated, entries } => {
                    writeln!(file, "updated={}", updated)?;
                    writeln!(file, "entries={}", serde_json::to_string(entries)?)?;
                }
                RunOutcome::Digest {
                    updated,
                    tweet_id,
                    entries_count,
                } => {
                    writeln!(file, "updated={}", updated)?;
                    writeln!(file, "tweet_id={}", tweet_id.as_deref().unwrap_or(""))?;
                    writeln!(file, "entries_count={}", entries_count)?;
                }
            }
        }
        Err(_) => {
            let value = match outcome {
                RunOutcome::Posts { updated, entries } => json!({
                    "updated": updated,
                    "entries": entries,
                }),
                RunOutcome::Digest {
                    updated,
                    tweet_id,
                    entries_count,
                } => json!({
                    "updated": updated,
                    "tweet_id": tweet_id,
                    "entries_count": entries_count,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}
