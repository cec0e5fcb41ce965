//! Blockfrost-compatible submit endpoint.
//!
//! `POST {base}/tx/submit` with the raw CBOR as an `application/cbor` body
//! and the project id in the `project_id` header. A successful response is
//! the transaction id as a JSON string. Self-hosted submit APIs that speak
//! the same dialect work with an empty project id.

use async_trait::async_trait;
use std::time::Duration;

use super::{ChainSubmitter, SubmitError};

/// Default request timeout for the submit call.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Submits through a Blockfrost-style HTTP API.
#[derive(Debug, Clone)]
pub struct BlockfrostSubmitter {
    client: reqwest::Client,
    api_base: String,
    project_id: Option<String>,
}

impl BlockfrostSubmitter {
    pub fn new(api_base: impl Into<String>, project_id: Option<String>) -> Result<Self, SubmitError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_SUBMIT_TIMEOUT)
            .build()
            .map_err(|e| SubmitError::Request(e.to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            project_id: project_id.filter(|id| !id.is_empty()),
        })
    }

    pub fn submit_url(&self) -> String {
        format!("{}/tx/submit", self.api_base)
    }
}

#[async_trait]
impl ChainSubmitter for BlockfrostSubmitter {
    async fn submit(&self, tx_cbor: &[u8]) -> Result<String, SubmitError> {
        let mut request = self
            .client
            .post(self.submit_url())
            .header(reqwest::header::CONTENT_TYPE, "application/cbor")
            .body(tx_cbor.to_vec());
        if let Some(project_id) = &self.project_id {
            request = request.header("project_id", project_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SubmitError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Rejected { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SubmitError::ParseResponse(e.to_string()))?;
        parse_tx_id(&body)
    }
}

/// Accepts `"<hex>"` (JSON) or bare `<hex>`.
fn parse_tx_id(body: &str) -> Result<String, SubmitError> {
    let trimmed = body.trim();
    let id = serde_json::from_str::<String>(trimmed).unwrap_or_else(|_| trimmed.to_string());
    if id.len() == 64 && id.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(id.to_ascii_lowercase())
    } else {
        Err(SubmitError::ParseResponse(format!(
            "expected a transaction id, got {trimmed:?}"
        )))
    }
}
