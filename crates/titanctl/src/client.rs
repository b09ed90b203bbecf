//! HTTP client for the titand API

use anyhow::{bail, Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use titan_common::{Envelope, ErrorBody};

pub struct TitanClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl TitanClient {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authorize(self.client.get(self.url(path)));
        self.send(path, request).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> Result<T> {
        let mut request = self.authorize(self.client.post(self.url(path)));
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(path, request).await
    }

    /// Prometheus text from `/metrics`
    pub async fn metrics_text(&self) -> Result<String> {
        let resp = self
            .client
            .get(self.url("/metrics"))
            .send()
            .await
            .with_context(|| format!("Failed to connect to titand at {}", self.base_url))?;
        if !resp.status().is_success() {
            bail!("/metrics returned {}", resp.status());
        }
        Ok(resp.text().await?)
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<T> {
        let resp = request
            .send()
            .await
            .with_context(|| format!("Failed to connect to titand at {}", self.base_url))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("{}", describe_error(path, status, &text));
        }

        let envelope: Envelope<T> = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse response from {}", path))?;
        Ok(envelope.data)
    }
}

fn describe_error(path: &str, status: StatusCode, text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(body) => {
            let code = body.code.map(|c| format!(" [{}]", c)).unwrap_or_default();
            let details = body.details.map(|d| format!(": {}", d)).unwrap_or_default();
            format!("{} failed ({}){}: {}{}", path, status, code, body.error, details)
        }
        Err(_) => format!("{} failed ({}): {}", path, status, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_error_body() {
        let msg = describe_error(
            "/optimization/execute",
            StatusCode::NOT_FOUND,
            r#"{"error":"No optimization plan available","code":"NO_PLAN"}"#,
        );
        assert_eq!(
            msg,
            "/optimization/execute failed (404 Not Found) [NO_PLAN]: No optimization plan available"
        );
    }

    #[test]
    fn test_describe_error_plain_text() {
        let msg = describe_error("/health", StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(msg, "/health failed (502 Bad Gateway): upstream down");
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = TitanClient::new("http://127.0.0.1:7870/", None);
        assert_eq!(client.url("/health"), "http://127.0.0.1:7870/health");
    }
}
