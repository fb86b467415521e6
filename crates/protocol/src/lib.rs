use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PROTOCOL_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct IngestResponse {
    pub doc_id: String,
    pub language: String,
    /// False when identical content was already stored
    pub added: bool,
    pub index_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct IngestBatchResponse {
    pub files_processed: usize,
    pub results: Vec<IngestResponse>,
    pub index_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct RetrieveResult {
    pub doc_id: String,
    /// Lower is closer
    pub score: f32,
    pub snippet: String,
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct RetrieveResponse {
    pub results: Vec<RetrieveResult>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct StatsResponse {
    pub schema_version: u32,
    pub documents: usize,
    pub dimension: Option<usize>,
    pub index_kind: String,
    pub embedding_model: String,
    pub languages: BTreeMap<String, usize>,
    pub data_dir: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    EmptyContent,
    EmptyQuery,
    InvalidK,
    UnsupportedFile,
    InvalidUtf8,
    InvalidConfig,
    StoreLocked,
    DependencyFailure,
    Internal,
}

impl ErrorCode {
    /// Validation failures are the caller's to fix; everything else is ours.
    #[must_use]
    pub const fn is_validation(self) -> bool {
        matches!(
            self,
            Self::EmptyContent
                | Self::EmptyQuery
                | Self::InvalidK
                | Self::UnsupportedFile
                | Self::InvalidUtf8
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorResponse {
    pub error: ErrorEnvelope,
}

/// JSON Schemas of every response body, keyed by type name.
pub fn response_schemas() -> Result<BTreeMap<&'static str, serde_json::Value>> {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        "IngestResponse",
        serde_json::to_value(schemars::schema_for!(IngestResponse))?,
    );
    schemas.insert(
        "IngestBatchResponse",
        serde_json::to_value(schemars::schema_for!(IngestBatchResponse))?,
    );
    schemas.insert(
        "RetrieveResponse",
        serde_json::to_value(schemars::schema_for!(RetrieveResponse))?,
    );
    schemas.insert(
        "StatsResponse",
        serde_json::to_value(schemars::schema_for!(StatsResponse))?,
    );
    schemas.insert(
        "ErrorResponse",
        serde_json::to_value(schemars::schema_for!(ErrorResponse))?,
    );
    Ok(schemas)
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ingest_response_omits_missing_filename() {
        let response = IngestResponse {
            doc_id: "doc_0".to_string(),
            language: "en".to_string(),
            added: true,
            index_size: 1,
            filename: None,
        };
        let raw = serialize_json(&response).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!({"doc_id": "doc_0", "language": "en", "added": true, "index_size": 1})
        );
    }

    #[test]
    fn error_codes_are_snake_case() {
        let response = ErrorResponse {
            error: ErrorEnvelope::new(ErrorCode::InvalidK, "k must be between 1 and 100, got 0")
                .with_hint("pass -k 1..=100"),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["error"]["code"], "invalid_k");
        assert_eq!(value["error"]["hint"], "pass -k 1..=100");
        assert!(value["error"].get("details").is_none());
        assert!(ErrorCode::InvalidK.is_validation());
        assert!(!ErrorCode::StoreLocked.is_validation());
    }

    #[test]
    fn schemas_cover_all_responses() {
        let schemas = response_schemas().unwrap();
        assert_eq!(schemas.len(), 5);
        let retrieve = serde_json::to_string(&schemas["RetrieveResponse"]).unwrap();
        assert!(retrieve.contains("snippet"));
    }
}
