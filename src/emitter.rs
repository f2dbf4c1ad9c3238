use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::EmitError;
use crate::signing::{build_signature_headers, SignatureHeaders};

/// A fully prepared POST request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub endpoint: Arc<str>,
    pub headers: SignatureHeaders,
    pub body: Vec<u8>,
}

/// Capability that performs the actual POST and returns the HTTP status.
///
/// Any response, including 4xx/5xx, is `Ok(status)`. Implementations should
/// honour `timeout`; the emitter enforces it regardless.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest, timeout: Duration) -> Result<u16, EmitError>;
}

/// Serializes documents and hands them to a [`Transport`].
#[derive(Clone)]
pub struct Emitter {
    transport: Arc<dyn Transport>,
    endpoint: Arc<str>,
    timeout: Duration,
}

impl Emitter {
    pub fn new(transport: Arc<dyn Transport>, endpoint: impl Into<Arc<str>>, timeout: Duration) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue one POST for `document`, returning the response status.
    pub async fn emit<D: Serialize>(&self, document: &D, signature: &str) -> Result<u16, EmitError> {
        let request = self.prepare(document, signature)?;
        self.send(request).await
    }

    /// Send an already prepared request under the emission timeout.
    pub async fn send(&self, request: OutboundRequest) -> Result<u16, EmitError> {
        match tokio::time::timeout(self.timeout, self.transport.send(request, self.timeout)).await {
            Ok(result) => result,
            Err(_) => Err(EmitError::Timeout(self.timeout)),
        }
    }

    /// Build the request without sending it.
    pub fn prepare<D: Serialize>(&self, document: &D, signature: &str) -> Result<OutboundRequest, EmitError> {
        Ok(OutboundRequest {
            endpoint: self.endpoint.clone(),
            headers: build_signature_headers(signature)?,
            body: encode_document(document)?,
        })
    }
}

/// Encode `document` as a UTF-8 JSON object.
pub fn encode_document<D: Serialize>(document: &D) -> Result<Vec<u8>, EmitError> {
    let value = serde_json::to_value(document).map_err(|err| EmitError::Serialize(err.to_string()))?;
    if !value.is_object() {
        return Err(EmitError::Serialize(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::to_vec(&value).map_err(|err| EmitError::Serialize(err.to_string()))
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Real delivery over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (connection pool, TLS settings, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn build_request(&self, request: OutboundRequest, timeout: Duration) -> Result<reqwest::Request, EmitError> {
        let mut builder = self
            .client
            .post(request.endpoint.as_ref())
            .timeout(timeout);

        for (name, value) in request.headers.iter() {
            let value = reqwest::header::HeaderValue::from_bytes(value.as_bytes())
                .map_err(|err| EmitError::Transport(err.to_string()))?;
            builder = builder.header(name, value);
        }

        builder
            .body(request.body)
            .build()
            .map_err(|err| EmitError::Transport(err.to_string()))
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: OutboundRequest, timeout: Duration) -> Result<u16, EmitError> {
        let request = self.build_request(request, timeout)?;

        match self.client.execute(request).await {
            // Status only; the body is never read.
            Ok(response) => Ok(response.status().as_u16()),
            Err(err) if err.is_timeout() => Err(EmitError::Timeout(timeout)),
            Err(err) => Err(EmitError::Transport(err.to_string())),
        }
    }
}
