use crate::delta::DeltaRecord;
use crate::types::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Remote summarization service. May fail with a rate-limit error whose
/// message carries a "retry in N s" hint.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String>;
}

/// Client for the generateContent API.
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, api_key })
    }

    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| NotifierError::MissingCredentials("GEMINI_API_KEY"))?;
        Self::new(api_key)
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn generate(&self, prompt: &str, model: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!("Requesting summary from model {}", model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::RateLimited { message: body });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Summarize(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GenerateResponse = response.json().await?;

        let text: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(NotifierError::Summarize("empty summary returned".to_string()));
        }

        Ok(text)
    }
}

/// Prompt for the daily digest post: the day's entries rendered as
/// title/body/link triples, with the posting constraints spelled out.
pub fn build_digest_prompt(entries: &[DeltaRecord], base_tags: &[String]) -> String {
    let mut parts = Vec::new();
    for entry in entries {
        let body = entry.description.as_deref().unwrap_or(&entry.summary);
        parts.push(format!("[{}]\n{}\nLink: {}\n", entry.title, body, entry.link));
    }
    let raw_text = parts.join("\n");

    let tag_line = if base_tags.is_empty() {
        String::new()
    } else {
        format!("- End with \"{}\".\n", base_tags.join(" "))
    };

    format!(
        "Below are today's gazette bulletins (detailed edition).\n\
         Write a short summary suitable for posting to X (Twitter).\n\n\
         Conditions:\n\
         - Keep it within 280 characters.\n\
         {}\
         - Keep dates and the names of important items. Bullet points and line breaks are fine.\n\n\
         --- Today's bulletins ---\n\n\
         {}\n\n\
         --- End ---\n\n\
         Output only the post text satisfying the conditions above.",
        tag_line, raw_text
    )
}
