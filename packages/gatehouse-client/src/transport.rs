//! HTTP transport.
//!
//! Issues requests against the configured base address and hands back the
//! raw status + body for the normalizer. Transport raises only for
//! conditions where the service could not be reached or its answer could not
//! be read; a coherent refusal from the service is not a transport error.

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Header carrying the service API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Raw response: status plus unparsed body, ready for normalization.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

enum Payload {
    Json(Value),
    Form(Vec<(String, String)>),
    Empty,
}

/// HTTP transport bound to one [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl Transport {
    /// Build a transport from a validated configuration.
    ///
    /// The cookie store is enabled so the service session cookie set during
    /// sign-in flows back on subsequent calls.
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(key) = &config.api_key {
            headers.insert(
                HeaderName::from_static(API_KEY_HEADER),
                HeaderValue::from_str(key)
                    .map_err(|_| ClientError::Config("API key is not a valid header value".into()))?,
            );
        }
        for (name, value) in &config.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::Config(format!("invalid header name: {}", name)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ClientError::Config(format!("invalid value for header {}", name)))?;
            headers.insert(name, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { http, config })
    }

    /// `POST /graphql` with a JSON `{query, variables}` body.
    pub async fn graphql(
        &self,
        document: &str,
        variables: Option<Value>,
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        let body = serde_json::json!({
            "query": document,
            "variables": variables,
        });
        self.send(Method::POST, "/graphql", Payload::Json(body), bearer)
            .await
    }

    /// Form-urlencoded POST (OAuth-style endpoints).
    pub async fn form_post(
        &self,
        endpoint: &str,
        fields: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        let fields = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.send(Method::POST, endpoint, Payload::Form(fields), bearer)
            .await
    }

    /// Plain GET.
    pub async fn get(&self, endpoint: &str, bearer: Option<&str>) -> Result<RawResponse> {
        self.send(Method::GET, endpoint, Payload::Empty, bearer)
            .await
    }

    /// Plain JSON POST.
    pub async fn post_json(
        &self,
        endpoint: &str,
        body: Value,
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        self.send(Method::POST, endpoint, Payload::Json(body), bearer)
            .await
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        payload: Payload,
        bearer: Option<&str>,
    ) -> Result<RawResponse> {
        let url = self.config.endpoint_url(endpoint);

        match &payload {
            Payload::Json(body) => {
                debug!(method = %method, endpoint, payload = %body, "gatehouse request")
            }
            Payload::Form(fields) => {
                debug!(method = %method, endpoint, fields = fields.len(), "gatehouse request")
            }
            Payload::Empty => debug!(method = %method, endpoint, "gatehouse request"),
        }

        let mut request = self.http.request(method, &url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request = match payload {
            Payload::Json(body) => request.json(&body),
            Payload::Form(fields) => request.form(&fields),
            Payload::Empty => request,
        };

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else {
                ClientError::Malformed(e.to_string())
            }
        })?;

        debug!(status = %status, body = %body, "gatehouse response");
        Ok(RawResponse { status, body })
    }
}
