pub mod types;
pub mod fetcher;
pub mod parser;
pub mod delta;
pub mod correlate;
pub mod compose;
pub mod packer;
pub mod retry;
pub mod poster;
pub mod summarizer;
pub mod orchestrator;
pub mod output;
pub mod cli;

pub use types::*;
pub use fetcher::Fetcher;
pub use delta::DeltaRecord;
pub use correlate::{CorrelatedGroup, SubstringMatcher, TitleMatcher};
pub use packer::{pack, PostBatch};
pub use poster::{Credentials, PostApi, StubPoster, XApiClient};
pub use summarizer::{GeminiClient, Summarizer};
pub use orchestrator::{Orchestrator, ReplyStrategy, RunConfig};
pub use output::RunOutcome;
