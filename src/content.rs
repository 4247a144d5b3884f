use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::{config::Content, search::SearchFilters};

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("Upstream request failed")]
    Request(#[from] reqwest::Error),
    #[error("Upstream responded with status {status}")]
    Status { status: u16, body: serde_json::Value },
    #[error("Invalid upstream path")]
    InvalidPath,
}

/// One page of upstream search results, passed through untouched.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct SearchPage {
    pub data: Vec<serde_json::Value>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug)]
pub struct RelayResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Read-only client for the upstream manga content API.
#[derive(Clone)]
pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<SecretString>,
    languages: Vec<String>,
}

impl ContentClient {
    pub fn new(config: &Content) -> Result<Self, ContentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            languages: config.languages.clone(),
        })
    }

    pub fn url(&self, path: &str) -> Result<String, ContentError> {
        let path = path.trim_start_matches('/');

        if path.is_empty()
            || path.contains("://")
            || path.contains(['?', '#'])
            || path.split('/').any(|segment| segment == ".." || segment == ".")
        {
            return Err(ContentError::InvalidPath);
        }

        Ok(format!("{}/{}", self.base_url, path))
    }

    fn get(&self, url: String, query: &[(String, String)]) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .query(query);

        match &self.token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    #[tracing::instrument(name = "search upstream manga", skip_all, fields(page = filters.page))]
    pub async fn search(&self, filters: &SearchFilters, limit: u32) -> Result<SearchPage, ContentError> {
        let mut query = filters.to_query(limit);
        for language in &self.languages {
            query.push(("availableTranslatedLanguage[]".to_string(), language.clone()));
        }

        let response = self.get(self.url("manga")?, &query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.json().await.unwrap_or(serde_json::Value::Null);
            return Err(ContentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    /// Forwards a GET as is. Non-success statuses are returned, not raised.
    #[tracing::instrument(name = "relay upstream request", skip(self, query))]
    pub async fn relay(&self, path: &str, query: &[(String, String)]) -> Result<RelayResponse, ContentError> {
        let response = self.get(self.url(path)?, query).send().await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        if !(200..300).contains(&status) {
            tracing::info!(status, "Upstream responded with failure status");
        }

        Ok(RelayResponse { status, body })
    }
}
