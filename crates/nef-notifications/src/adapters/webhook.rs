use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use super::{NotificationAdapter, SendResult};
use crate::error::NotificationError;

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("nef-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// POSTs notifications as `application/json`. One attempt per call.
pub struct WebhookAdapter {
    http_client: Client,
}

impl WebhookAdapter {
    pub fn new(config: &WebhookConfig) -> Result<Self, NotificationError> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?;
        Ok(Self { http_client })
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl NotificationAdapter for WebhookAdapter {
    async fn send(
        &self,
        destination: &str,
        body: &serde_json::Value,
    ) -> Result<SendResult, NotificationError> {
        let scheme = destination.split_once("://").map(|(s, _)| s).unwrap_or("");
        if !self.supports(scheme) {
            return Err(NotificationError::InvalidDestination(destination.to_string()));
        }

        let payload = serde_json::to_vec(body)?;
        let started = Instant::now();

        let response = self
            .http_client
            .post(destination)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if status.is_success() {
            tracing::debug!(
                destination = %destination,
                status = status.as_u16(),
                elapsed_ms,
                "Notification delivered"
            );
            Ok(SendResult::delivered(status.as_u16(), elapsed_ms))
        } else {
            let mut error = response.text().await.unwrap_or_default();
            error.truncate(MAX_ERROR_BODY);
            tracing::warn!(
                destination = %destination,
                status = status.as_u16(),
                elapsed_ms,
                "Notification rejected by destination"
            );
            Ok(SendResult::rejected(
                status.as_u16(),
                format!("Webhook returned {status}: {error}"),
                elapsed_ms,
            ))
        }
    }

    fn supports(&self, scheme: &str) -> bool {
        matches!(scheme, "http" | "https")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter() -> WebhookAdapter {
        WebhookAdapter::new(&WebhookConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn posts_json_and_reports_success() {
        let server = MockServer::start().await;
        let body = json!({ "subscription": "/x", "monitoringEventReports": [] });
        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(header("content-type", "application/json"))
            .and(body_json(&body))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = adapter()
            .send(&format!("{}/notify", server.uri()), &body)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.status, Some(204));
    }

    #[tokio::test]
    async fn non_success_status_is_reported_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let result = adapter()
            .send(&format!("{}/notify", server.uri()), &json!({}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.status, Some(503));
        assert!(result.error.unwrap().contains("busy"));
    }

    #[tokio::test]
    async fn rejects_non_http_destinations() {
        let err = adapter().send("mailto:af@example.com", &json!({})).await;
        assert!(matches!(err, Err(NotificationError::InvalidDestination(_))));
    }

    #[tokio::test]
    async fn unreachable_destination_is_an_error() {
        let err = adapter().send("http://127.0.0.1:9/notify", &json!({})).await;
        assert!(matches!(err, Err(NotificationError::SendFailed(_))));
    }
}
