//! Text-generation trait for schema-constrained model calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};

/// Kind of task a generation call is for. Providers may route on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Label discovered sources with keep / priority / category.
    SourceTriage,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceTriage => "source_triage",
        }
    }
}

/// A single structured generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub task_type: TaskType,
    pub prompt: String,
    /// JSON schema the response must conform to.
    pub response_schema: serde_json::Value,
    pub max_tokens: u32,
    /// Allow the provider to repair near-miss JSON instead of failing.
    pub allow_repair: bool,
}

/// Text-generation service with a strict JSON-schema response contract.
///
/// Implementations must either return JSON that parses, or an error. They
/// must never hand back free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_structured(&self, request: &GenerationRequest) -> Result<serde_json::Value>;

    /// Generator name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Parse raw model output as JSON.
///
/// With `allow_repair`, strips markdown code fences and any prose around
/// the outermost JSON object before giving up.
pub fn parse_structured(raw: &str, allow_repair: bool) -> Result<serde_json::Value> {
    match serde_json::from_str(raw.trim()) {
        Ok(value) => Ok(value),
        Err(e) if !allow_repair => Err(DiscoveryError::JsonParse(e)),
        Err(e) => repair_json(raw).ok_or(DiscoveryError::JsonParse(e)),
    }
}

fn repair_json(raw: &str) -> Option<serde_json::Value> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|s| s.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    if let Ok(value) = serde_json::from_str(unfenced.trim()) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}
