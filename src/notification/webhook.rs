//! Delivery of JSON payloads over HTTP.
//!
//! Every HTTP transport ends up here: the payload is posted with the
//! configured method and headers, optionally signed with an HMAC-SHA256
//! `X-Signature` over the body and an `X-Timestamp`.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{
    Method,
    header::{HeaderMap, HeaderName, HeaderValue},
};
use reqwest_middleware::ClientWithMiddleware;
use sha2::Sha256;

use super::error::NotificationError;

/// HMAC SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Where and how a payload is delivered.
#[derive(Debug, Clone, Default)]
pub struct WebhookClientConfig {
    /// Target URL.
    pub url: String,
    /// Query parameters appended to the URL, values URL-encoded.
    pub url_params: Option<HashMap<String, String>>,
    /// HTTP method, `POST` when unset.
    pub method: Option<String>,
    /// HMAC key for the `X-Signature` header.
    pub secret: Option<String>,
    /// Extra request headers.
    pub headers: Option<HashMap<String, String>>,
}

/// Posts JSON payloads to a single endpoint.
#[derive(Debug)]
pub struct WebhookClient {
    url: String,
    url_params: Option<HashMap<String, String>>,
    client: Arc<ClientWithMiddleware>,
    method: Method,
    secret: Option<String>,
    headers: HashMap<String, String>,
}

impl WebhookClient {
    /// Creates a client for `config`. Fails on an unknown HTTP method.
    pub fn new(
        config: WebhookClientConfig,
        http_client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, NotificationError> {
        let method = match config.method.as_deref() {
            Some(m) => Method::from_bytes(m.to_uppercase().as_bytes()).map_err(|e| {
                NotificationError::ConfigError(format!("Invalid HTTP method '{m}': {e}"))
            })?,
            None => Method::POST,
        };

        Ok(Self {
            url: config.url,
            url_params: config.url_params,
            client: http_client,
            method,
            secret: config.secret,
            headers: config.headers.unwrap_or_default(),
        })
    }

    /// Signs `payload` with `secret`, returning the hex signature and the
    /// millisecond timestamp that was signed along with it.
    pub fn sign_payload(
        &self,
        secret: &str,
        payload: &serde_json::Value,
    ) -> Result<(String, String), NotificationError> {
        // `new_from_slice` accepts an empty key.
        if secret.is_empty() {
            return Err(NotificationError::ConfigError(
                "Invalid secret: cannot be empty.".to_string(),
            ));
        }

        let timestamp = Utc::now().timestamp_millis();

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| NotificationError::ConfigError(format!("Invalid secret: {e}")))?;

        let serialized_payload = serde_json::to_string(payload).map_err(|e| {
            NotificationError::InternalError(format!("Failed to serialize payload: {e}"))
        })?;
        mac.update(format!("{serialized_payload}{timestamp}").as_bytes());

        let signature = hex::encode(mac.finalize().into_bytes());

        Ok((signature, timestamp.to_string()))
    }

    fn request_url(&self) -> String {
        match &self.url_params {
            Some(params) if !params.is_empty() => {
                let mut pairs: Vec<String> = params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect();
                pairs.sort();
                let separator = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.url, separator, pairs.join("&"))
            }
            _ => self.url.clone(),
        }
    }

    fn request_headers(&self, payload: &serde_json::Value) -> Result<HeaderMap, NotificationError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("content-type"),
            HeaderValue::from_static("application/json"),
        );

        if let Some(secret) = &self.secret {
            let (signature, timestamp) = self.sign_payload(secret, payload)?;
            headers.insert(
                HeaderName::from_static("x-signature"),
                HeaderValue::from_str(&signature).map_err(|e| {
                    NotificationError::InternalError(format!("Invalid signature value: {e}"))
                })?,
            );
            headers.insert(
                HeaderName::from_static("x-timestamp"),
                HeaderValue::from_str(&timestamp).map_err(|e| {
                    NotificationError::InternalError(format!("Invalid timestamp value: {e}"))
                })?,
            );
        }

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                NotificationError::ConfigError(format!("Invalid header name: {key}: {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                NotificationError::ConfigError(format!(
                    "Invalid header value for {key}: {value}: {e}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    /// Sends `payload`, failing on any non-2xx response.
    pub async fn notify_json(&self, payload: &serde_json::Value) -> Result<(), NotificationError> {
        let headers = self.request_headers(payload)?;
        let url = self.request_url();

        let response = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(headers)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::NotifyFailed(format!(
                "Request failed with status {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Mock};
    use serde_json::json;

    use super::*;

    fn create_test_http_client() -> Arc<ClientWithMiddleware> {
        Arc::new(reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build())
    }

    fn create_test_client(
        url: &str,
        secret: Option<&str>,
        headers: Option<HashMap<String, String>>,
    ) -> WebhookClient {
        let config = WebhookClientConfig {
            url: url.to_string(),
            secret: secret.map(|s| s.to_string()),
            headers,
            ..Default::default()
        };
        WebhookClient::new(config, create_test_http_client()).unwrap()
    }

    fn create_test_payload() -> serde_json::Value {
        json!({"title": "disk_free on web1 - CRITICAL", "body": "DISK CRITICAL"})
    }

    #[test]
    fn test_sign_payload() {
        let client = create_test_client("https://webhook.example.com", Some("s"), None);
        let (signature, timestamp) =
            client.sign_payload("test-secret", &create_test_payload()).unwrap();

        assert!(hex::decode(&signature).is_ok(), "Signature should be valid hex");
        assert_eq!(signature.len(), 64);
        assert!(timestamp.parse::<i64>().is_ok(), "Timestamp should be valid i64");
    }

    #[test]
    fn test_sign_payload_fails_empty_secret() {
        let client = create_test_client("https://webhook.example.com", None, None);
        let result = client.sign_payload("", &create_test_payload());
        assert!(matches!(result.unwrap_err(), NotificationError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_method_is_config_error() {
        let config = WebhookClientConfig {
            url: "http://localhost".to_string(),
            method: Some("NOT A METHOD".to_string()),
            ..Default::default()
        };
        let result = WebhookClient::new(config, create_test_http_client());
        assert!(matches!(result.unwrap_err(), NotificationError::ConfigError(_)));
    }

    #[test]
    fn test_request_url_encodes_params() {
        let config = WebhookClientConfig {
            url: "https://api.example.com/room/Ops/notification".to_string(),
            url_params: Some(HashMap::from([("auth_token".to_string(), "a b&c".to_string())])),
            ..Default::default()
        };
        let client = WebhookClient::new(config, create_test_http_client()).unwrap();
        assert_eq!(
            client.request_url(),
            "https://api.example.com/room/Ops/notification?auth_token=a%20b%26c"
        );
    }

    #[tokio::test]
    async fn test_notify_failure_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").with_status(404).with_body("no such room").create_async().await;

        let client = create_test_client(server.url().as_str(), None, None);
        let err = client.notify_json(&create_test_payload()).await.unwrap_err();

        assert!(matches!(err, NotificationError::NotifyFailed(_)));
        assert!(err.to_string().contains("no such room"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_unreachable_endpoint() {
        let client = create_test_client("http://127.0.0.1:1", None, None);
        let result = client.notify_json(&create_test_payload()).await;
        assert!(matches!(result.unwrap_err(), NotificationError::RequestError(_)));
    }

    #[tokio::test]
    async fn test_notify_includes_signature_and_timestamp() {
        let mut server = mockito::Server::new_async().await;
        let mock: Mock = server
            .mock("POST", "/")
            .match_header("X-Signature", Matcher::Regex("^[0-9a-f]{64}$".to_string()))
            .match_header("X-Timestamp", Matcher::Regex("^[0-9]+$".to_string()))
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::Json(create_test_payload()))
            .with_status(200)
            .create_async()
            .await;

        let client = create_test_client(server.url().as_str(), Some("top-secret"), None);
        let result = client.notify_json(&create_test_payload()).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_notify_with_invalid_header_name() {
        let server = mockito::Server::new_async().await;
        let invalid_headers =
            HashMap::from([("Invalid Header!@#".to_string(), "value".to_string())]);

        let client = create_test_client(server.url().as_str(), None, Some(invalid_headers));
        let err = client.notify_json(&create_test_payload()).await.unwrap_err();
        assert!(err.to_string().contains("Invalid header name"));
    }

    #[tokio::test]
    async fn test_notify_with_custom_headers() {
        let mut server = mockito::Server::new_async().await;
        let headers = HashMap::from([("X-Custom-Header".to_string(), "valid-value".to_string())]);

        let mock = server
            .mock("PUT", "/")
            .match_header("X-Custom-Header", "valid-value")
            .with_status(204)
            .create_async()
            .await;

        let config = WebhookClientConfig {
            url: server.url(),
            method: Some("put".to_string()),
            headers: Some(headers),
            ..Default::default()
        };
        let client = WebhookClient::new(config, create_test_http_client()).unwrap();

        assert!(client.notify_json(&create_test_payload()).await.is_ok());
        mock.assert_async().await;
    }
}
