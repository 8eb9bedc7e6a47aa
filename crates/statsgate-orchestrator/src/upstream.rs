use async_trait::async_trait;
use statsgate_core::GatewayError;
use std::time::Duration;

use crate::types::AchievementsPayload;

/// The upstream collaborator contract. The typed wire schema stays an
/// external concern; this trait is the Rust seam the orchestrator fans
/// out through, so tests can swap in a fake client without touching
/// the fan-out logic itself.
#[async_trait]
pub trait SteamClient: Send + Sync {
    async fn fetch_stats(&self, player_id: &str) -> Result<serde_json::Value, GatewayError<String>>;

    async fn fetch_achievements(
        &self,
        player_id: &str,
    ) -> Result<AchievementsPayload, GatewayError<String>>;
}

/// `reqwest`-backed `SteamClient`: build the request, map transport
/// failures to `GatewayError::Network`, and classify non-2xx responses
/// by status.
pub struct ReqwestSteamClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ReqwestSteamClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builder should not fail with default TLS config");
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn classify_error_response(response: reqwest::Response) -> GatewayError<String> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status, body, "upstream returned non-success response");
        match status {
            404 => GatewayError::NotFound,
            401 | 403 => GatewayError::PrivateProfile,
            429 => GatewayError::RateLimited { retry_after: None },
            _ => GatewayError::UpstreamHttp { status },
        }
    }
}

#[async_trait]
impl SteamClient for ReqwestSteamClient {
    async fn fetch_stats(&self, player_id: &str) -> Result<serde_json::Value, GatewayError<String>> {
        let url = format!("{}/players/{}/stats", self.base_url, player_id);
        let request = self.apply_auth(self.client.get(&url));
        let response = request.send().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Self::classify_error_response(response).await);
        }

        response.json::<serde_json::Value>().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse upstream stats response");
            GatewayError::UpstreamHttp { status: 502 }
        })
    }

    async fn fetch_achievements(
        &self,
        player_id: &str,
    ) -> Result<AchievementsPayload, GatewayError<String>> {
        let url = format!("{}/players/{}/achievements", self.base_url, player_id);
        let request = self.apply_auth(self.client.get(&url));
        let response = request.send().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(Self::classify_error_response(response).await);
        }

        response.json::<AchievementsPayload>().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse upstream achievements response");
            GatewayError::UpstreamHttp { status: 502 }
        })
    }
}
