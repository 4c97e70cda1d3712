use std::time::Duration;

use async_trait::async_trait;
use nef_api::policy::AppSessionContext;
use reqwest::{Client, header};
use tracing::{info, warn};

use super::{ConnectorError, PolicyAuthorization};

const APP_SESSIONS_PATH: &str = "/npcf-policyauthorization/v1/app-sessions";

/// Npcf_PolicyAuthorization client.
pub struct HttpPolicyClient {
    http_client: Client,
    base_url: String,
}

impl HttpPolicyClient {
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

    fn sessions_url(&self) -> String {
        format!("{}{APP_SESSIONS_PATH}", self.base_url)
    }
}

/// The app session id is whatever follows `/app-sessions/` in the
/// resource URI returned by the policy controller.
pub fn app_session_id(location: &str) -> Option<&str> {
    location
        .split_once("/app-sessions/")
        .map(|(_, rest)| rest.trim_end_matches('/'))
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

#[async_trait]
impl PolicyAuthorization for HttpPolicyClient {
    async fn create_session(
        &self,
        context: &AppSessionContext,
    ) -> Result<String, ConnectorError> {
        let response = self
            .http_client
            .post(self.sessions_url())
            .json(context)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Policy controller rejected app session");
            return Err(ConnectorError::Protocol(format!(
                "policy controller returned {status}"
            )));
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ConnectorError::Protocol("missing Location header".into()))?;
        let id = app_session_id(location).ok_or_else(|| {
            ConnectorError::Malformed(format!("unexpected app session location {location}"))
        })?;

        info!(app_session_id = %id, "Created policy authorization app session");
        Ok(id.to_string())
    }

    async fn delete_session(&self, app_session_id: &str) -> Result<(), ConnectorError> {
        let response = self
            .http_client
            .post(format!("{}/{app_session_id}/delete", self.sessions_url()))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ConnectorError::NotFound(app_session_id.to_string()));
        }
        if !status.is_success() {
            return Err(ConnectorError::Protocol(format!(
                "policy controller returned {status}"
            )));
        }
        info!(app_session_id = %app_session_id, "Deleted policy authorization app session");
        Ok(())
    }
}
