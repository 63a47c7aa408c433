//! GitHub REST client.
//!
//! Endpoints used:
//! - `GET/PUT /repos/{owner}/{repo}/contents/{path}`
//! - `POST /user/repos`
//! - `GET /repos/{owner}/{repo}`
//! - `GET /user`
//!
//! Auth: `Authorization: token <access token>`

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{ContentsApi, RemoteFile};
use crate::error::CodeHubError;

const ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("codehub/", env!("CARGO_PKG_VERSION"));

/// Description used for repositories created by codehub
pub const REPO_DESCRIPTION: &str =
    "A collection of questions to ace the coding interview! - Created using [codehub](https://github.com/)";

/// Errors talking to the GitHub API
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub returned {status} for {path}")]
    Status { status: u16, path: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid GitHub response: {0}")]
    InvalidResponse(String),
}

impl GitHubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Stale SHA on a write
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(StatusCode::CONFLICT.as_u16())
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND.as_u16())
    }
}

/// Repository summary returned by create/link
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    /// `owner/repo`
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

/// Authenticated GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
    api_url: String,
    token: String,
    client: reqwest::Client,
}

impl GitHubClient {
    /// Create a client for an API base URL such as `https://api.github.com`
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("token {}", self.token))
            .header("Accept", ACCEPT)
            .header("User-Agent", USER_AGENT)
    }

    /// Scope the client to one repository's files
    pub fn contents(&self, hook: impl Into<String>) -> RepoContents {
        RepoContents {
            github: self.clone(),
            hook: hook.into(),
        }
    }

    /// Login of the token's owner
    pub async fn current_user(&self) -> Result<String, GitHubError> {
        let url = self.api_url("user");
        let response = self.request(Method::GET, &url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                path: "user".to_string(),
            });
        }
        let user: UserResponse = response.json().await?;
        Ok(user.login)
    }

    /// Create a private, auto-initialised repository owned by the user
    pub async fn create_repo(&self, name: &str) -> Result<RepoInfo, CodeHubError> {
        let url = self.api_url("user/repos");
        let response = self
            .request(Method::POST, &url)
            .json(&serde_json::json!({
                "name": name,
                "private": true,
                "auto_init": true,
                "description": REPO_DESCRIPTION,
            }))
            .send()
            .await
            .map_err(GitHubError::from)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(CodeHubError::Repository {
                status,
                message: create_error_message(status, name),
            });
        }

        Ok(response.json().await.map_err(GitHubError::from)?)
    }

    /// Look up an existing repository by `owner/repo`
    pub async fn get_repo(&self, full_name: &str) -> Result<RepoInfo, CodeHubError> {
        let url = self.api_url(&format!("repos/{}", full_name));
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(GitHubError::from)?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(CodeHubError::Repository {
                status,
                message: link_error_message(status, full_name),
            });
        }

        Ok(response.json().await.map_err(GitHubError::from)?)
    }
}

/// Explanation for a failed repository creation
pub fn create_error_message(status: u16, name: &str) -> String {
    match status {
        304 => format!("Error creating {} - Unable to modify repository. Try again later!", name),
        400 => format!(
            "Error creating {} - Bad POST request, make sure you're not overriding any existing scripts",
            name
        ),
        401 => format!("Error creating {} - Unauthorized access to repo. Try again later!", name),
        403 => format!("Error creating {} - Forbidden access to repository. Try again later!", name),
        422 => format!(
            "Error creating {} - Unprocessable Entity. Repository may have already been created. Try linking instead.",
            name
        ),
        _ => format!("Error creating {} - GitHub returned {}", name, status),
    }
}

/// Explanation for a failed repository link
pub fn link_error_message(status: u16, name: &str) -> String {
    match status {
        301 => format!(
            "Error linking {} - This repository has been moved permanently. Try creating a new one.",
            name
        ),
        403 => format!(
            "Error linking {} - Forbidden action. Please make sure you have the right access to this repository.",
            name
        ),
        404 => format!(
            "Error linking {} - Resource not found. Make sure you enter the right repository name.",
            name
        ),
        _ => format!("Error linking {} - GitHub returned {}", name, status),
    }
}

/// Contents endpoint of one repository
#[derive(Clone)]
pub struct RepoContents {
    github: GitHubClient,
    hook: String,
}

impl RepoContents {
    pub fn hook(&self) -> &str {
        &self.hook
    }

    fn contents_url(&self, path: &str) -> String {
        self.github
            .api_url(&format!("repos/{}/contents/{}", self.hook, path))
    }
}

#[async_trait]
impl ContentsApi for RepoContents {
    async fn get_file(&self, path: &str) -> Result<RemoteFile, GitHubError> {
        let url = self.contents_url(path);
        let response = self.github.request(Method::GET, &url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body: ContentsResponse = response.json().await?;
        Ok(RemoteFile {
            content: body.content,
            sha: body.sha,
        })
    }

    async fn put_file(
        &self,
        path: &str,
        content: &str,
        sha: Option<&str>,
        message: &str,
    ) -> Result<String, GitHubError> {
        let url = self.contents_url(path);
        let response = self
            .github
            .request(Method::PUT, &url)
            .json(&PutRequest {
                message,
                content,
                sha: sha.filter(|s| !s.is_empty()),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GitHubError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let body: PutResponse = response.json().await?;
        debug!(path, sha = %body.content.sha, "Committed file");
        Ok(body.content.sha)
    }
}
