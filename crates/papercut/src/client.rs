//! Authenticated XML-RPC client for the PaperCut web services API.

use std::error::Error as _;
use std::time::Duration;

use tracing::debug;
use url::Url;
use xmlrpc::{MethodCall, Value};

use crate::config::CallConfig;
use crate::error::{Error, Result};

/// One-shot client bound to an endpoint and auth token.
///
/// Every remote call goes out as `method(token, ...params)`.
pub struct Client {
    http: reqwest::Client,
    endpoint: Url,
    token: String,
    timeout: Duration,
}

impl Client {
    /// Validate the endpoint and build a client with the configured timeout.
    pub fn open(config: &CallConfig) -> Result<Self> {
        let endpoint = parse_endpoint(&config.url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transport(describe(&e)))?;

        Ok(Self {
            http,
            endpoint,
            token: config.token.clone(),
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Issue one remote call and return its untyped result.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let body = MethodCall::new(method)
            .with_param(self.token.as_str())
            .with_params(params)
            .to_xml();

        debug!(method, endpoint = %self.endpoint, "XML-RPC call");

        let response = self
            .http
            .post(self.endpoint.as_str())
            .header("content-type", "text/xml")
            .header("accept", "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body = body.trim();
            return Err(Error::HttpStatus(if body.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {body}")
            }));
        }

        let text = response
            .text()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let value = xmlrpc::parse_response(&text)?.into_result()?;
        debug!(method, "XML-RPC call succeeded");
        Ok(value)
    }

    fn transport_error(&self, err: &reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout.as_millis() as u64)
        } else {
            Error::Transport(describe(err))
        }
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(Error::UnsupportedScheme(other.to_string())),
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidEndpoint {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Error message followed by its source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}
