//! The one-line JSON result every worker invocation must print.
//!
//! Schema: `{"status": <int>, "txId"?: <string>, "cborTx"?: <hex>, "msg"?: <string>, ...}`.
//! Unknown fields are kept in [`WorkerResult::extra`] (the info query
//! returns its figures that way). Anything that does not parse against this
//! schema is a protocol violation, reported by the dispatcher as status 500.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{WORKER_STATUS_FAILURE, WORKER_STATUS_OK, WORKER_STATUS_TIMEOUT};

/// Result line produced by a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResult {
    /// Worker-internal status. Lives in its own namespace; see `config`.
    pub status: i64,

    /// Network transaction id, present on a successful submit.
    #[serde(rename = "txId", default, skip_serializing_if = "Option::is_none")]
    pub tx_id: Option<String>,

    /// Hex CBOR of the unsigned transaction, present on a successful build.
    #[serde(rename = "cborTx", default, skip_serializing_if = "Option::is_none")]
    pub cbor_tx: Option<String>,

    /// Free-form message. Never forwarded to the web tier.
    #[serde(rename = "msg", alias = "message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Any other fields the worker emitted, `payload` included. Some workers
    /// put the build artifact there; others put an object of figures.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Ways a worker's stdout can break the one-line contract.
#[derive(Debug, Error)]
pub enum WorkerProtocolError {
    #[error("worker produced no output")]
    NoOutput,

    #[error("worker output is not valid UTF-8")]
    NotUtf8,

    #[error("worker produced {0} output lines, expected exactly one")]
    MultipleLines(usize),

    #[error("worker output is not a result object: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl WorkerResult {
    /// A bare result with the given status.
    pub fn with_status(status: i64) -> Self {
        Self {
            status,
            tx_id: None,
            cbor_tx: None,
            message: None,
            extra: serde_json::Map::new(),
        }
    }

    /// `{"status": 500}`: the collapse target for every unexpected failure.
    pub fn failure() -> Self {
        Self::with_status(WORKER_STATUS_FAILURE)
    }

    /// `{"status": 408}`: the worker ran out of time and was killed.
    pub fn timeout() -> Self {
        Self::with_status(WORKER_STATUS_TIMEOUT)
    }

    /// `{"status": 200, "txId": ...}`: a successful submission.
    pub fn submitted(tx_id: impl Into<String>) -> Self {
        Self {
            tx_id: Some(tx_id.into()),
            ..Self::with_status(WORKER_STATUS_OK)
        }
    }

    /// `{"status": 200, "cborTx": ...}`: a successful build (or merge).
    pub fn built(cbor_tx_hex: impl Into<String>) -> Self {
        Self {
            cbor_tx: Some(cbor_tx_hex.into()),
            ..Self::with_status(WORKER_STATUS_OK)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == WORKER_STATUS_OK
    }

    /// The build artifact, wherever the worker chose to put it. A
    /// `payload` only counts when it is a string.
    pub fn artifact(&self) -> Option<&str> {
        self.cbor_tx
            .as_deref()
            .or_else(|| self.extra.get("payload").and_then(|v| v.as_str()))
            .or(self.message.as_deref())
    }

    /// Parses captured stdout. Surrounding whitespace is ignored; more than
    /// one non-blank line is not.
    pub fn from_stdout(stdout: &[u8]) -> Result<Self, WorkerProtocolError> {
        let text = std::str::from_utf8(stdout).map_err(|_| WorkerProtocolError::NotUtf8)?;
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        match lines.as_slice() {
            [] => Err(WorkerProtocolError::NoOutput),
            [line] => Ok(serde_json::from_str(line)?),
            more => Err(WorkerProtocolError::MultipleLines(more.len())),
        }
    }

    /// Renders the result as the single stdout line a worker must print.
    pub fn to_json_line(&self) -> String {
        // A map of strings and integers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"status":500}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_success() {
        let r = WorkerResult::from_stdout(br#"{"status":200,"txId":"abc123"}"#).unwrap();
        assert!(r.is_ok());
        assert_eq!(r.tx_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn parses_build_success_from_any_payload_field() {
        for line in [
            r#"{"status":200,"cborTx":"84a4"}"#,
            r#"{"status":200,"payload":"84a4"}"#,
            r#"{"status":200,"message":"84a4"}"#,
        ] {
            let r = WorkerResult::from_stdout(line.as_bytes()).unwrap();
            assert_eq!(r.artifact(), Some("84a4"), "line: {line}");
        }
    }

    #[test]
    fn object_payload_is_kept_as_a_field() {
        let r = WorkerResult::from_stdout(br#"{"status":200,"payload":{"lcSupply":7}}"#)
            .unwrap();
        assert!(r.is_ok());
        assert_eq!(r.extra["payload"]["lcSupply"], 7);
        assert_eq!(r.artifact(), None);
    }

    #[test]
    fn trailing_newline_and_whitespace_are_fine() {
        let r = WorkerResult::from_stdout(b"  {\"status\":501}\n\n").unwrap();
        assert_eq!(r.status, 501);
    }

    #[test]
    fn keeps_unknown_fields() {
        let r = WorkerResult::from_stdout(br#"{"status":200,"adaAmount":"42","lcSupply":7}"#)
            .unwrap();
        assert_eq!(r.extra.get("lcSupply"), Some(&serde_json::json!(7)));
    }

    #[test]
    fn rejects_empty_output() {
        assert!(matches!(
            WorkerResult::from_stdout(b"   \n"),
            Err(WorkerProtocolError::NoOutput)
        ));
    }

    #[test]
    fn rejects_multiple_lines() {
        assert!(matches!(
            WorkerResult::from_stdout(b"warning: deprecated\n{\"status\":200}\n"),
            Err(WorkerProtocolError::MultipleLines(2))
        ));
    }

    #[test]
    fn rejects_non_integer_status() {
        assert!(WorkerResult::from_stdout(br#"{"status":"200"}"#).is_err());
        assert!(WorkerResult::from_stdout(br#"{"txId":"abc"}"#).is_err());
        assert!(WorkerResult::from_stdout(b"TypeError: undefined").is_err());
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(matches!(
            WorkerResult::from_stdout(&[0xff, 0xfe]),
            Err(WorkerProtocolError::NotUtf8)
        ));
    }

    #[test]
    fn json_line_omits_absent_fields() {
        assert_eq!(WorkerResult::failure().to_json_line(), r#"{"status":500}"#);
        assert_eq!(
            WorkerResult::submitted("ff00").to_json_line(),
            r#"{"status":200,"txId":"ff00"}"#
        );
    }
}
