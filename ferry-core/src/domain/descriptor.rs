//! Copy job descriptor

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while reading a job descriptor
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Job descriptor must be a JSON object")]
    NotAnObject,

    #[error("Submission response did not contain any copy job")]
    EmptySubmission,

    #[error("Job descriptor is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Opaque token set identifying one asynchronous copy job
///
/// The server requires the exact fields it issued (`JobId`, `JobQueueUri`,
/// `EncryptionKey`, ...) to be sent back on every status check, so the
/// descriptor keeps the original object untouched, key order included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobDescriptor(Map<String, Value>);

impl JobDescriptor {
    /// Builds a descriptor from a JSON value
    ///
    /// Accepts the descriptor object itself, or a `CreateCopyJobs` response
    /// (`{ "value": [descriptor, ...] }` or a bare array), in which case the
    /// first job is used.
    pub fn from_value(value: Value) -> Result<Self, DescriptorError> {
        match value {
            Value::Object(mut map) => {
                if map.len() == 1 && matches!(map.get("value"), Some(Value::Array(_))) {
                    match map.remove("value") {
                        Some(Value::Array(jobs)) => Self::first_of(jobs),
                        _ => Err(DescriptorError::EmptySubmission),
                    }
                } else {
                    Ok(Self(map))
                }
            }
            Value::Array(jobs) => Self::first_of(jobs),
            _ => Err(DescriptorError::NotAnObject),
        }
    }

    /// Parses a descriptor from JSON text
    pub fn from_json(text: &str) -> Result<Self, DescriptorError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    fn first_of(jobs: Vec<Value>) -> Result<Self, DescriptorError> {
        match jobs.into_iter().next() {
            Some(Value::Object(map)) => Ok(Self(map)),
            Some(_) => Err(DescriptorError::NotAnObject),
            None => Err(DescriptorError::EmptySubmission),
        }
    }

    /// The server-generated job id, when present and well formed
    pub fn job_id(&self) -> Option<Uuid> {
        self.0
            .get("JobId")
            .and_then(Value::as_str)
            .and_then(|id| Uuid::parse_str(id).ok())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for JobDescriptor {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
