//! Input helpers
//!
//! Reads JSON documents from a file or, for `-`, from stdin.

use anyhow::{Context, Result};
use ferry_core::domain::JobDescriptor;
use std::io::Read;

/// Reads a whole document from a path, `-` meaning stdin
pub fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("unable to read {}", path))
    }
}

/// Reads a job descriptor, or the submission response that contains one
pub fn read_descriptor(path: &str) -> Result<JobDescriptor> {
    parse_descriptor(&read_source(path)?)
}

pub fn parse_descriptor(text: &str) -> Result<JobDescriptor> {
    JobDescriptor::from_json(text).context("failed to parse copy job descriptor")
}

/// Reads any JSON value
pub fn read_json(path: &str) -> Result<serde_json::Value> {
    serde_json::from_str(&read_source(path)?).context("failed to parse JSON")
}
