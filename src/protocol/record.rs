// src/protocol/record.rs

//! Typed protocol records and the accumulated response.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::result::{LogEntry, DEFAULT_LOG_LEVEL};

/// Status code a result record uses to signal success.
pub const SUCCESS_STATUS: i64 = 200;

/// One protocol line, classified by which required field it carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolRecord {
    /// `{"file": ..., "status": ..., "successful": ...}`
    Result(ResultRecord),
    /// `{"message": ..., "level": ...}`
    Log(LogEntry),
}

/// Shape A of the protocol.
///
/// Fields other than the three known ones are kept in `extra` so they can be
/// echoed back in diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub file: String,
    #[serde(
        default,
        deserialize_with = "present_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<ResultStatus>,
    /// A present `null` counts as `false`.
    #[serde(
        default,
        deserialize_with = "present_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub successful: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `status` field of a result record, once it is present.
///
/// Anything that is not an integral number (`null`, a string, `200.5`) is
/// kept as `Unrecognized` and never equals the success status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultStatus {
    Code(i64),
    Unrecognized(Value),
}

impl ResultStatus {
    pub fn from_value(value: Value) -> Self {
        if let Some(code) = value.as_i64() {
            return ResultStatus::Code(code);
        }

        // 2^53: beyond this an f64 no longer holds every integer exactly.
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() <= MAX_EXACT => ResultStatus::Code(f as i64),
            _ => ResultStatus::Unrecognized(value),
        }
    }

    pub fn is_success(&self) -> bool {
        *self == ResultStatus::Code(SUCCESS_STATUS)
    }
}

impl From<i64> for ResultStatus {
    fn from(code: i64) -> Self {
        ResultStatus::Code(code)
    }
}

// Only called when the field is present, so `null` ends up as `Some(..)`.
fn present_status<'de, D>(deserializer: D) -> Result<Option<ResultStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|v| Some(ResultStatus::from_value(v)))
}

fn present_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Some(Option::<bool>::deserialize(deserializer)?.unwrap_or(false)))
}

impl ProtocolRecord {
    /// Classify a decoded JSON line.
    ///
    /// - a non-empty string `file` makes it a result record,
    /// - otherwise a non-empty string `message` makes it a log record,
    /// - anything else yields `None` and is dropped by the parser.
    pub fn classify(line: &str, value: Value) -> Result<Option<Self>, ProtocolError> {
        let Value::Object(fields) = value else {
            return Ok(None);
        };

        if non_empty_str(&fields, "file").is_some() {
            let record: ResultRecord = serde_json::from_value(Value::Object(fields))
                .map_err(|source| ProtocolError::MalformedRecord {
                    line: line.to_string(),
                    source,
                })?;
            return Ok(Some(ProtocolRecord::Result(record)));
        }

        if let Some(message) = non_empty_str(&fields, "message") {
            let level = non_empty_str(&fields, "level").unwrap_or(DEFAULT_LOG_LEVEL);
            return Ok(Some(ProtocolRecord::Log(LogEntry::new(level, message))));
        }

        Ok(None)
    }
}

fn non_empty_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Everything collected from a child's stdout.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProtocolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResultStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub successful: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<LogEntry>,
}

impl ProtocolResponse {
    /// Merge a result record; fields it carries overwrite earlier values.
    pub fn merge(&mut self, record: ResultRecord) {
        self.file = Some(record.file);
        if record.status.is_some() {
            self.status = record.status;
        }
        if record.successful.is_some() {
            self.successful = record.successful;
        }
        self.extra.extend(record.extra);
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    /// Whether the response marks the test run as failed.
    ///
    /// A run is unsuccessful if the status is present and not 200 (a `null`
    /// status is present), if the success flag is present and false, or if
    /// neither is present at all.
    pub fn indicates_failure(&self) -> bool {
        match (&self.status, self.successful) {
            (None, None) => true,
            (status, successful) => {
                status.as_ref().is_some_and(|s| !s.is_success()) || successful == Some(false)
            }
        }
    }

    /// Compact JSON rendering used in diagnostics.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}
