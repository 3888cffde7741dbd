// HTTP history service - queries stored records from the telemetry backend
use crate::application::history_service::HistoryService;
use crate::domain::query::RequestDescriptor;
use crate::domain::record::Record;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct HttpHistoryService {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    data: Vec<Record>,
}

impl HttpHistoryService {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_query_url(&self, query: &RequestDescriptor) -> String {
        format!("{}/api/data?{}", self.base_url, query.to_query_string())
    }
}

#[async_trait]
impl HistoryService for HttpHistoryService {
    async fn fetch(&self, query: &RequestDescriptor) -> Result<Vec<Record>> {
        let url = self.build_query_url(query);
        tracing::debug!("Fetching history: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to history service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("History query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<HistoryResponse>()
            .await
            .context("Failed to parse history response")?;

        tracing::debug!("History returned {} records", data.data.len());
        Ok(data.data)
    }
}
