use crate::types::{NotifierError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::{info, warn};

const POST_ENDPOINT: &str = "https://api.x.com/2/tweets";

/// Client for the social posting API. Both calls may fail with a generic
/// posting error or a rate-limit error carrying a retry-after hint.
#[async_trait]
pub trait PostApi: Send + Sync {
    /// Submit a root post, returning its id.
    async fn create_post(&self, text: &str) -> Result<String>;

    /// Submit a reply chained to `parent_id`, returning the reply's id.
    async fn create_reply(&self, text: &str, parent_id: &str) -> Result<String>;
}

/// Posting credentials, loaded from the environment. Values are held only to
/// be attached to requests and never appear in logs.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl Credentials {
    /// Read the four posting variables. Returns None when any is missing so
    /// the caller can skip posting for the whole run with a warning.
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("X_API_KEY").ok()?;
        let api_secret = env::var("X_API_SECRET").ok()?;
        let access_token = env::var("X_ACCESS_TOKEN").ok()?;
        let access_token_secret = env::var("X_ACCESS_TOKEN_SECRET").ok()?;

        Some(Self {
            api_key,
            api_secret,
            access_token,
            access_token_secret,
        })
    }
}

/// HTTP implementation against the v2 posting endpoint.
pub struct XApiClient {
    client: Client,
    credentials: Credentials,
}

#[derive(Debug, Serialize)]
struct CreatePostRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyTarget<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyTarget<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatePostData,
}

#[derive(Debug, Deserialize)]
struct CreatePostData {
    id: String,
}

impl XApiClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, credentials })
    }

    async fn submit(&self, text: &str, parent_id: Option<&str>) -> Result<String> {
        let request = CreatePostRequest {
            text,
            reply: parent_id.map(|id| ReplyTarget {
                in_reply_to_tweet_id: id,
            }),
        };

        let response = self
            .client
            .post(POST_ENDPOINT)
            .bearer_auth(&self.credentials.access_token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(|s| format!("retry in {} s", s));
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::RateLimited {
                message: retry_after.unwrap_or(body),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Post(format!("HTTP {}: {}", status, body)));
        }

        let parsed: CreatePostResponse = response.json().await?;
        info!("Posted: {}", parsed.data.id);

        Ok(parsed.data.id)
    }
}

#[async_trait]
impl PostApi for XApiClient {
    async fn create_post(&self, text: &str) -> Result<String> {
        self.submit(text, None).await
    }

    async fn create_reply(&self, text: &str, parent_id: &str) -> Result<String> {
        self.submit(text, Some(parent_id)).await
    }
}

/// Debug-mode client: logs what would have been posted and hands back a
/// fixed id so the rest of the run proceeds normally.
pub struct StubPoster;

#[async_trait]
impl PostApi for StubPoster {
    async fn create_post(&self, text: &str) -> Result<String> {
        warn!("Debug mode, post skipped ({} chars)", text.chars().count());
        Ok("debug".to_string())
    }

    async fn create_reply(&self, text: &str, parent_id: &str) -> Result<String> {
        warn!(
            "Debug mode, reply to {} skipped ({} chars)",
            parent_id,
            text.chars().count()
        );
        Ok("debug".to_string())
    }
}
