use serde::Deserialize;
use serde_json::Value;

/// Outcome of importing one account within the batch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemResult {
    pub email: String,
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressRecord {
    pub current: u64,
    pub total: u64,
    pub success_count: u64,
    pub failed_count: u64,
    #[serde(default)]
    pub last_result: Option<ItemResult>,
}

/// One line of the import progress feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedRecord {
    Start {
        total: u64,
    },
    Progress(ProgressRecord),
    Finish {
        total: u64,
        success_count: u64,
        failed_count: u64,
    },
    Error {
        #[serde(rename = "error", alias = "message")]
        message: String,
    },
}

impl FeedRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedRecord::Start { .. } => "start",
            FeedRecord::Progress(_) => "progress",
            FeedRecord::Finish { .. } => "finish",
            FeedRecord::Error { .. } => "error",
        }
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, FeedRecord::Finish { .. })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LineError {
    #[error("blank line")]
    Blank,
    #[error("invalid json: {0}")]
    Json(String),
    #[error("record has no string `type` field")]
    MissingType,
    #[error("unknown record type `{0}`")]
    UnknownType(String),
    #[error("malformed `{kind}` record: {message}")]
    Schema { kind: String, message: String },
}

const KNOWN_TYPES: [&str; 4] = ["start", "progress", "finish", "error"];

/// Parses one feed line. Any error means the line is skipped, never that the feed stops.
pub fn parse_line(line: &str) -> Result<FeedRecord, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(LineError::Blank);
    }

    let value: Value = serde_json::from_str(line).map_err(|err| LineError::Json(err.to_string()))?;
    let kind = match value.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => return Err(LineError::MissingType),
    };
    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(LineError::UnknownType(kind));
    }

    serde_json::from_value(value).map_err(|err| LineError::Schema {
        kind,
        message: err.to_string(),
    })
}
