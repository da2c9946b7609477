// src/service/response.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::result::ExecutionResult;

/// Status reported for a successful test run.
pub const STATUS_OK: u16 = 200;
/// Status reported for a failed test run.
pub const STATUS_UNAVAILABLE: u16 = 503;

/// What a request-routing layer should send back for a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Value,
    /// Value for an `X-test-start` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_start: Option<DateTime<Utc>>,
    /// Value for an `X-test-end` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_end: Option<DateTime<Utc>>,
}

impl ResultResponse {
    pub fn from_result(result: &ExecutionResult, default_content_type: &str) -> Self {
        Self {
            status: if result.successful {
                STATUS_OK
            } else {
                STATUS_UNAVAILABLE
            },
            content_type: result.content_type_or(default_content_type).to_string(),
            body: result.body.clone(),
            test_start: result.start_time,
            test_end: result.end_time,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }
}
