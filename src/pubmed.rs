//! PubMed E-utilities client.
//!
//! `esearch` turns a query into PubMed IDs, `efetch` turns IDs into
//! [`Paper`] records. Fetching is batched with a short pause between
//! batches, as NCBI asks of unauthenticated clients.

use crate::error::{FinderError, Result};
use crate::models::Paper;
use crate::parser::parse_fetch_response;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// E-utilities base URL
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Contact email sent with every request (NCBI recommendation)
pub const DEFAULT_EMAIL: &str = "your.email@example.com";

/// Tool name sent with every request (NCBI recommendation)
pub const DEFAULT_TOOL: &str = "pubmed-company-finder";

/// Client configuration
#[derive(Debug, Clone)]
pub struct PubMedConfig {
    pub base_url: String,
    pub email: String,
    pub tool: String,
    /// NCBI API key, raises the rate limit
    pub api_key: Option<String>,
    /// IDs per efetch request
    pub batch_size: usize,
    /// Pause between efetch batches
    pub batch_delay: Duration,
    pub timeout: Duration,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            email: DEFAULT_EMAIL.to_string(),
            tool: DEFAULT_TOOL.to_string(),
            api_key: None,
            batch_size: 50,
            batch_delay: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

impl PubMedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(FinderError::Config("base_url must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(FinderError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR", default)]
    error: Option<String>,
}

/// PubMed E-utilities client
pub struct PubMedClient {
    client: Client,
    config: PubMedConfig,
}

impl PubMedClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Config`] for an invalid configuration or if the
    /// HTTP client cannot be built.
    pub fn new(config: PubMedConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .user_agent(format!("{}/1.0 (mailto:{})", config.tool, config.email))
            .timeout(config.timeout)
            .build()
            .map_err(|e| FinderError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &PubMedConfig {
        &self.config
    }

    fn endpoint(&self, name: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.config.base_url.trim_end_matches('/'), name))
            .map_err(|e| FinderError::Config(format!("Invalid base URL: {}", e)))
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("tool", self.config.tool.clone()),
            ("email", self.config.email.clone()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("api_key", key.clone()));
        }
        params
    }

    /// Search for papers matching the query and return PubMed IDs.
    ///
    /// # Arguments
    ///
    /// * `query` - Query in PubMed syntax
    /// * `max_results` - Maximum number of IDs to return
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        debug!(query, max_results, "Searching PubMed");

        let mut params = self.base_params();
        params.push(("term", query.to_string()));
        params.push(("retmax", max_results.to_string()));
        params.push(("retmode", "json".to_string()));

        let body = self.get_text(self.endpoint("esearch.fcgi")?, &params).await?;
        let response: ESearchResponse = serde_json::from_str(&body)?;

        if let Some(err) = response.esearchresult.error {
            warn!(error = %err, "esearch reported an error");
        }

        let pmids = response.esearchresult.idlist;
        info!(count = pmids.len(), "Found papers matching the query");
        Ok(pmids)
    }

    /// Fetch detailed records for a list of PubMed IDs.
    ///
    /// Articles that fail to parse are skipped; a failed request aborts.
    pub async fn fetch_papers(&self, pmids: &[String]) -> Result<Vec<Paper>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = self.endpoint("efetch.fcgi")?;
        let batches: Vec<&[String]> = pmids.chunks(self.config.batch_size).collect();
        let mut papers = Vec::with_capacity(pmids.len());

        for (idx, batch) in batches.iter().enumerate() {
            debug!(
                batch = idx + 1,
                total_batches = batches.len(),
                papers = batch.len(),
                "Fetching batch"
            );

            let mut params = self.base_params();
            params.push(("id", batch.join(",")));
            params.push(("retmode", "xml".to_string()));

            let xml = self.get_text(endpoint.clone(), &params).await?;
            let parsed = parse_fetch_response(&xml)?;
            if parsed.len() < batch.len() {
                debug!(
                    requested = batch.len(),
                    parsed = parsed.len(),
                    "Some records missing from batch"
                );
            }
            papers.extend(parsed);

            if idx + 1 < batches.len() && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        info!(total = papers.len(), "Fetched paper details");
        Ok(papers)
    }

    async fn get_text(&self, url: Url, params: &[(&'static str, String)]) -> Result<String> {
        let response = self.client.get(url).query(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(1);
            return Err(FinderError::RateLimited(retry_after));
        }

        if !status.is_success() {
            return Err(FinderError::Api {
                code: status.as_u16() as i32,
                message: format!("E-utilities error: {}", status),
            });
        }

        Ok(response.text().await?)
    }
}
