//! GitHub OAuth device flow.
//!
//! 1. POST the device code endpoint with the client id and scopes
//! 2. Show `user_code` and `verification_uri` to the user
//! 3. Poll the access token endpoint every `interval` seconds until a token
//!    arrives, the user denies access, or `expires_in` elapses

use std::future::Future;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::{debug, info};

use super::GitHubError;
use crate::error::{CodeHubError, Result};

const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Response from the device code endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_expires_in() -> u64 {
    600
}
fn default_interval() -> u64 {
    5
}

/// Response from the access token endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// What a single token poll means for the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Token(String),
    Pending,
    /// Server asked us to back off; add 5 seconds to the interval
    SlowDown,
    Failed(String),
}

impl TokenResponse {
    pub fn outcome(self) -> PollOutcome {
        if let Some(token) = self.access_token.filter(|t| !t.is_empty()) {
            return PollOutcome::Token(token);
        }
        match self.error.as_deref() {
            Some("authorization_pending") => PollOutcome::Pending,
            Some("slow_down") => PollOutcome::SlowDown,
            Some(error) => PollOutcome::Failed(match self.error_description {
                Some(description) => format!("{}: {}", error, description),
                None => error.to_string(),
            }),
            None => PollOutcome::Failed("empty token response".to_string()),
        }
    }
}

/// Device-flow client for one OAuth app
pub struct DeviceFlowClient {
    client_id: String,
    scopes: Vec<String>,
    device_code_url: String,
    access_token_url: String,
    client: reqwest::Client,
}

impl DeviceFlowClient {
    pub fn new(
        client_id: impl Into<String>,
        scopes: Vec<String>,
        device_code_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            scopes,
            device_code_url: device_code_url.into(),
            access_token_url: access_token_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create from the resolved configuration
    pub fn from_config(config: &crate::config::OAuthSettings) -> Self {
        Self::new(
            config.client_id.clone(),
            config.scopes.clone(),
            config.device_code_url.clone(),
            config.access_token_url.clone(),
        )
    }

    /// Start a device authorization
    pub async fn request_device_code(&self) -> Result<DeviceCode> {
        let response = self
            .client
            .post(&self.device_code_url)
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "scope": self.scopes.join(" "),
            }))
            .send()
            .await
            .map_err(GitHubError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CodeHubError::DeviceFlow(format!(
                "device code request returned {}",
                status
            )));
        }

        Ok(response.json().await.map_err(GitHubError::from)?)
    }

    /// Ask once whether the user has finished authorizing
    pub async fn poll_once(&self, device_code: &str) -> Result<PollOutcome> {
        let response: TokenResponse = self
            .client
            .post(&self.access_token_url)
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "client_id": self.client_id,
                "device_code": device_code,
                "grant_type": GRANT_TYPE,
            }))
            .send()
            .await
            .map_err(GitHubError::from)?
            .json()
            .await
            .map_err(GitHubError::from)?;

        Ok(response.outcome())
    }

    /// Poll until the user authorizes the device code
    pub async fn poll_for_token(&self, code: &DeviceCode) -> Result<String> {
        poll_until_authorized(code, || self.poll_once(&code.device_code)).await
    }
}

/// Drive the polling loop with any poll function.
///
/// Waits `interval` seconds between polls and gives up once `expires_in`
/// seconds have passed since the first poll.
pub async fn poll_until_authorized<F, Fut>(code: &DeviceCode, mut poll: F) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome>>,
{
    let started = Instant::now();
    let expires = Duration::from_secs(code.expires_in);
    let mut interval = Duration::from_secs(code.interval);

    loop {
        if started.elapsed() >= expires {
            return Err(CodeHubError::DeviceFlowTimeout(code.expires_in));
        }

        match poll().await? {
            PollOutcome::Token(token) => {
                info!("Device flow authorized");
                return Ok(token);
            }
            PollOutcome::Pending => {
                debug!(?interval, "Authorization pending");
            }
            PollOutcome::SlowDown => {
                interval += Duration::from_secs(5);
                debug!(?interval, "Slowing down token polling");
            }
            PollOutcome::Failed(error) => return Err(CodeHubError::DeviceFlow(error)),
        }

        tokio::time::sleep(interval).await;
    }
}
