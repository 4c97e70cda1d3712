use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{ConnectorError, IdentityResolver};

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    #[serde(alias = "supi", rename = "Supi")]
    supi: String,
}

/// Resolves external identifiers through the UE identity service.
pub struct HttpIdentityResolver {
    http_client: Client,
    base_url: String,
}

impl HttpIdentityResolver {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ConnectorError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConnectorError::Connection(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn resolve(&self, af_id: &str, external_id: &str) -> Result<String, ConnectorError> {
        let response = self
            .http_client
            .get(format!("{}/resolve", self.base_url))
            .query(&[("externalId", external_id)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                return Err(ConnectorError::NotFound(format!(
                    "the external ID {external_id} was not found"
                )));
            }
            status => {
                return Err(ConnectorError::Protocol(format!(
                    "identity service returned {status}"
                )));
            }
        }

        let body: ResolveResponse = response.json().await?;
        if body.supi.is_empty() {
            return Err(ConnectorError::Malformed("empty Supi in response".into()));
        }
        debug!(af_id = %af_id, external_id = %external_id, "Resolved external identifier");
        Ok(body.supi)
    }
}
