//! Shared HTTP plumbing for the downstream service clients.

use std::time::Duration;

use axum::http::StatusCode;
use librarium_core::Username;
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{GatewayError, GatewayResult};

/// Identity channel between the gateway and its downstreams.
pub const X_USER_NAME: &str = "X-User-Name";

/// Client-side timeout on every outbound call, independent of any breaker
/// timeout. A timed-out call counts as a failure like any other error.
pub const DOWNSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Thin reqwest wrapper: base-url joining, JSON codec, and mapping of
/// transport/status failures into [`GatewayError::Downstream`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    /// Status attributed to transport-level failures (connect refused,
    /// timeout). The rating service reports 503 here, the rest report 400.
    transport_error_status: StatusCode,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        transport_error_status: StatusCode,
    ) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DOWNSTREAM_TIMEOUT)
            .build()
            .map_err(|err| GatewayError::Internal(format!("http client: {err}")))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            transport_error_status,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        user: Option<&Username>,
    ) -> GatewayResult<T> {
        let builder = self.client.get(self.url(path));
        let resp = self.execute(builder, user).await?;
        decode(resp).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        user: Option<&Username>,
        query: &Q,
    ) -> GatewayResult<T> {
        let builder = self.client.get(self.url(path)).query(query);
        let resp = self.execute(builder, user).await?;
        decode(resp).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        user: Option<&Username>,
        body: &B,
    ) -> GatewayResult<T> {
        let builder = self.client.post(self.url(path)).json(body);
        let resp = self.execute(builder, user).await?;
        decode(resp).await
    }

    pub async fn patch_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        user: Option<&Username>,
        body: &B,
    ) -> GatewayResult<()> {
        let builder = self.client.patch(self.url(path)).json(body);
        self.execute(builder, user).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str, user: Option<&Username>) -> GatewayResult<()> {
        let builder = self.client.delete(self.url(path));
        self.execute(builder, user).await?;
        Ok(())
    }

    async fn execute(
        &self,
        mut builder: RequestBuilder,
        user: Option<&Username>,
    ) -> GatewayResult<reqwest::Response> {
        if let Some(user) = user {
            builder = builder.header(X_USER_NAME, user.as_str());
        }

        let resp = builder.send().await.map_err(|err| {
            debug!(error = %err, "downstream transport failure");
            GatewayError::Downstream {
                status: self.transport_error_status,
                message: err.to_string(),
            }
        })?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let message = resp.text().await.unwrap_or_default();
            let message = if message.is_empty() {
                "downstream error".to_string()
            } else {
                message
            };
            return Err(GatewayError::Downstream { status, message });
        }

        Ok(resp)
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> GatewayResult<T> {
    resp.json()
        .await
        .map_err(|err| GatewayError::Internal(format!("decode downstream response: {err}")))
}
