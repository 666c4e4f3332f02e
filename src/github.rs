use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::{info, warn};

use crate::error::ApiError;

/// Reads a user's most recently created public repositories from the GitHub REST API.
pub struct GithubClient {
    http: Client,
    base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl GithubClient {
    pub fn new(
        base_url: impl Into<String>,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("devconnect/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id,
            client_secret,
        })
    }

    fn repos_request(&self, username: &str) -> RequestBuilder {
        let mut query: Vec<(&str, &str)> = vec![("per_page", "5"), ("sort", "created:asc")];
        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            query.push(("client_id", id.as_str()));
            query.push(("client_secret", secret.as_str()));
        }

        self.http
            .get(format!("{}/users/{}/repos", self.base_url, username))
            .query(&query)
    }

    pub async fn latest_repos(&self, username: &str) -> Result<serde_json::Value, ApiError> {
        // GitHub login hanya boleh huruf, angka dan '-'
        if username.is_empty()
            || !username
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ApiError::not_found("No Github profile found"));
        }

        let response = self
            .repos_request(username)
            .send()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            warn!("❌ GitHub returned {} for {}", response.status(), username);
            return Err(ApiError::not_found("No Github profile found"));
        }

        let repos = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| ApiError::Upstream(e.to_string()))?;

        info!("✅ Fetched GitHub repos for {}", username);
        Ok(repos)
    }
}
