//! Copy job progress reports
//!
//! `GetCopyJobProgress` answers with a job state and a list of log lines.
//! Each log line is usually a JSON object serialized into a string, e.g.
//!
//! ```json
//! {
//!   "JobState": 4,
//!   "Logs": [
//!     "{\"Event\":\"JobStart\",\"JobId\":\"...\",\"Time\":\"10/19/2026 09:00:00.000\"}",
//!     "{\"Event\":\"JobProgress\",\"TotalExpectedSPObjects\":\"12\",\"ObjectsProcessed\":\"3\"}"
//!   ]
//! }
//! ```
//!
//! Decoding is deliberately forgiving: unknown fields are kept, counts may be
//! numbers or strings, and a line that is not JSON survives as an `Unknown`
//! event carrying the raw text.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Tag given to log lines that could not be decoded
pub const UNKNOWN_EVENT: &str = "Unknown";

/// Reasons a status payload cannot be turned into a report
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Progress response contains no report")]
    Empty,

    #[error("Progress report must be a JSON object")]
    NotAnObject,

    #[error("Progress report has neither a job state nor a log")]
    MissingFields,

    #[error("Progress report could not be decoded: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// One status check result
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ProgressReport {
    /// `0` once the job is finished; bit `4` is set while it is processing
    #[serde(rename = "JobState", default, deserialize_with = "lenient::number")]
    pub job_state: Option<i64>,

    #[serde(rename = "Logs", default, deserialize_with = "decode_logs")]
    pub logs: Vec<LogEvent>,

    #[serde(rename = "ErrorCode", default, deserialize_with = "lenient::text")]
    pub error_code: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProgressReport {
    /// Decodes the most recent report out of a status response body
    ///
    /// The body may be a single report, an array of reports, or an OData
    /// `{ "value": [...] }` wrapper. The last report wins.
    pub fn latest(body: &Value) -> Result<Self, DecodeError> {
        let report = match body {
            Value::Array(reports) => reports.last(),
            Value::Object(map) => match map.get("value") {
                Some(Value::Array(reports)) => reports.last(),
                _ => Some(body),
            },
            _ => return Err(DecodeError::NotAnObject),
        }
        .ok_or(DecodeError::Empty)?;

        let Value::Object(fields) = report else {
            return Err(DecodeError::NotAnObject);
        };

        if !fields.contains_key("JobState") && !fields.contains_key("Logs") {
            return Err(DecodeError::MissingFields);
        }

        Ok(Self::deserialize(report)?)
    }

    /// Whether the server still flags the job as processing
    pub fn is_processing(&self) -> bool {
        self.job_state.is_some_and(|state| state & 4 == 4)
    }

    /// `(processed, total_expected)` of the latest event reporting both
    pub fn latest_counts(&self) -> Option<(u64, u64)> {
        self.logs
            .iter()
            .rev()
            .find_map(|event| Some((event.processed?, event.total_expected?)))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &LogEvent> {
        self.logs.iter().filter(|event| event.is_warning())
    }
}

/// One entry of the job log
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEvent {
    #[serde(default = "unknown_event")]
    pub event: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub message: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub time: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub correlation_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub error_code: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub error_type: Option<String>,

    #[serde(
        rename = "TotalExpectedSPObjects",
        default,
        deserialize_with = "lenient::number"
    )]
    pub total_expected: Option<u64>,

    #[serde(
        rename = "ObjectsProcessed",
        default,
        deserialize_with = "lenient::number"
    )]
    pub processed: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEvent {
    /// Decodes one raw log line, never failing
    pub fn from_line(line: Value) -> Self {
        let parsed = match &line {
            Value::String(text) => serde_json::from_str::<LogEvent>(text).ok(),
            Value::Object(_) => LogEvent::deserialize(&line).ok(),
            _ => None,
        };

        parsed.unwrap_or_else(|| {
            Self::unparsed(match line {
                Value::String(text) => text,
                other => other.to_string(),
            })
        })
    }

    fn unparsed(text: String) -> Self {
        Self {
            event: UNKNOWN_EVENT.to_string(),
            message: Some(text),
            ..Default::default()
        }
    }

    /// `JobError`, `JobFatalError` and any other error or exception tag
    pub fn is_error(&self) -> bool {
        let tag = self.event.to_ascii_lowercase();
        tag.ends_with("error") || tag.ends_with("exception")
    }

    pub fn is_warning(&self) -> bool {
        self.event.eq_ignore_ascii_case("JobWarning")
    }

    pub fn is_end(&self) -> bool {
        self.event.eq_ignore_ascii_case("JobEnd")
    }

    /// Best effort human readable cause of an error entry
    ///
    /// Looks at `Message`, then `ErrorMessage`, then the `Message` of a
    /// nested `Exception` or `InnerException` object.
    pub fn failure_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .and_then(usable)
            .or_else(|| self.extra.get("ErrorMessage").and_then(Value::as_str).and_then(usable))
            .or_else(|| {
                ["Exception", "InnerException"].iter().find_map(|key| {
                    self.extra
                        .get(*key)
                        .and_then(|cause| cause.get("Message"))
                        .and_then(Value::as_str)
                        .and_then(usable)
                })
            })
    }
}

fn usable(text: &str) -> Option<&str> {
    let text = text.trim();
    (!text.is_empty()).then_some(text)
}

fn unknown_event() -> String {
    UNKNOWN_EVENT.to_string()
}

fn decode_logs<'de, D>(deserializer: D) -> Result<Vec<LogEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let lines = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(lines.into_iter().map(LogEvent::from_line).collect())
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    /// Strings as is, other scalars rendered as text, null as absent
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => Some(other.to_string()),
        })
    }

    /// Integers given either as JSON numbers or numeric strings
    pub fn number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr + TryFrom<i64> + TryFrom<u64>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|v| <T as TryFrom<i64>>::try_from(v).ok())
                .or_else(|| {
                    n.as_u64()
                        .and_then(|v| <T as TryFrom<u64>>::try_from(v).ok())
                }),
            Some(Value::String(text)) => text.trim().parse().ok(),
            _ => None,
        })
    }
}
