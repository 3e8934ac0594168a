//! Outbound submit: the `Transport` seam and its reqwest implementation.

use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::config;
use crate::error::{CatalogError, Result};
use crate::validate::ItemFailure;
use crate::wire::WirePayload;

// ---------------------------------------------------------------------------
// SubmitReceipt
// ---------------------------------------------------------------------------

/// Outcome reported by the API for one submit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub success: bool,
    pub status: u16,
    pub id: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
}

impl SubmitReceipt {
    /// Interpret a response body. Missing or non-JSON bodies fall back to
    /// the HTTP status.
    pub fn from_response(status: u16, body: &str) -> Self {
        let ok_status = (200..300).contains(&status);
        let json: Value = serde_json::from_str(body).unwrap_or(Value::Null);

        let success = json
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(ok_status)
            && ok_status;
        let message = ["message", "error"]
            .iter()
            .find_map(|k| json.get(*k).and_then(Value::as_str))
            .map(String::from)
            .or_else(|| (!ok_status && !body.trim().is_empty() && json.is_null()).then(|| body.trim().to_string()));
        let id = ["id", "_id"]
            .iter()
            .find_map(|k| {
                json.get(*k)
                    .or_else(|| json.get("data").and_then(|d| d.get(*k)))
                    .and_then(Value::as_str)
            })
            .map(String::from);
        let failures = ["failures", "errors"]
            .iter()
            .find_map(|k| json.get(*k).and_then(Value::as_array))
            .map(|items| items.iter().filter_map(parse_failure).collect())
            .unwrap_or_default();

        Self {
            success,
            status,
            id,
            message,
            failures,
        }
    }
}

fn parse_failure(item: &Value) -> Option<ItemFailure> {
    let identifier = ["identifier", "stockNumber", "field", "row"]
        .iter()
        .find_map(|k| item.get(*k))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })?;
    let error = ["error", "message"]
        .iter()
        .find_map(|k| item.get(*k).and_then(Value::as_str))
        .unwrap_or("unknown error")
        .to_string();
    Some(ItemFailure { identifier, error })
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends a payload and reports what the API said about it.
pub trait Transport: Send + Sync {
    fn send(&self, payload: &WirePayload) -> Result<SubmitReceipt>;
}

/// Multipart-over-HTTP transport backed by a blocking reqwest client.
///
/// Creates go out as `POST {base}/{category path}`; edits as
/// `PUT {base}/{category path}/{id}`.
pub struct HttpTransport {
    base_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration, auth_token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, payload: &WirePayload) -> String {
        format!("{}/{}", self.base_url, payload.endpoint())
    }

    fn build_form(payload: &WirePayload) -> Result<Form> {
        let mut form = Form::new();
        for (key, value) in &payload.fields {
            form = form.text(key.clone(), value.clone());
        }
        form = form.text(config::METADATA_PART, payload.metadata_json()?);
        for part in &payload.parts {
            let body = Part::bytes(part.bytes()?)
                .file_name(part.file_name().to_string())
                .mime_str(part.mime())?;
            form = form.part(part.name.clone(), body);
        }
        Ok(form)
    }
}

impl Transport for HttpTransport {
    fn send(&self, payload: &WirePayload) -> Result<SubmitReceipt> {
        let url = self.url_for(payload);
        let form = Self::build_form(payload)?;
        let request = if payload.is_update() {
            self.client.put(&url)
        } else {
            self.client.post(&url)
        };
        let request = match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        info!(url = %url, parts = payload.parts.len(), "Submitting product");
        let resp = request.multipart(form).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        debug!(status, bytes = body.len(), "Submit response received");

        Ok(SubmitReceipt::from_response(status, &body))
    }
}

/// Convert a receipt into the submit boundary's single error.
pub fn ensure_success(receipt: SubmitReceipt) -> Result<SubmitReceipt> {
    if receipt.success {
        return Ok(receipt);
    }
    let message = receipt
        .message
        .clone()
        .unwrap_or_else(|| format!("server responded with status {}", receipt.status));
    Err(CatalogError::Transport(message))
}
