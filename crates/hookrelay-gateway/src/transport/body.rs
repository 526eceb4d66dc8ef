//! Bounded request body reader.
//!
//! The body is streamed chunk by chunk and the read is abandoned as soon as
//! the running total passes the limit; the rest of the stream is dropped.

use std::borrow::Cow;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde_json::Value;

use hookrelay_core::error::{HookError, Result};

const JSON_MEDIA_TYPE: &str = "application/json";

/// A fully read request body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadBody {
    pub raw: String,
    /// Parsed body for JSON requests with a non-empty body.
    pub json: Option<Value>,
    pub is_json: bool,
}

impl ReadBody {
    /// Value handed to route-key lookup and summarizers: the parsed JSON, or
    /// the raw text as a JSON string.
    pub fn payload(&self) -> Cow<'_, Value> {
        match &self.json {
            Some(v) => Cow::Borrowed(v),
            None => Cow::Owned(Value::String(self.raw.clone())),
        }
    }

    /// Text rendered as the message body preview. JSON bodies are
    /// pretty-printed; an empty JSON body shows as `{}`.
    pub fn body_text(&self) -> String {
        if !self.is_json {
            return self.raw.clone();
        }
        let empty = Value::Object(Default::default());
        serde_json::to_string_pretty(self.json.as_ref().unwrap_or(&empty))
            .unwrap_or_else(|_| self.raw.clone())
    }
}

pub fn is_json_request(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains(JSON_MEDIA_TYPE))
}

pub async fn read_body(headers: &HeaderMap, body: Body, limit_bytes: usize) -> Result<ReadBody> {
    let mut stream = body.into_data_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::debug!(error = %e, "body stream failed");
            HookError::ReadBodyFailed
        })?;
        if buf.len() + chunk.len() > limit_bytes {
            return Err(HookError::BodyTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }

    let raw = String::from_utf8_lossy(&buf).into_owned();
    let is_json = is_json_request(headers);

    if raw.is_empty() || !is_json {
        return Ok(ReadBody { raw, json: None, is_json });
    }

    let json = serde_json::from_str(&raw).map_err(|_| HookError::InvalidJson)?;
    Ok(ReadBody { raw, json: Some(json), is_json })
}
