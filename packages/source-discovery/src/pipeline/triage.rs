//! AI triage - model-assisted keep / priority / category labeling.
//!
//! Sources go to the text-generation service in fixed-size batches, one
//! prompt per batch, processed sequentially. Each batch is isolated: a
//! service error, malformed JSON or schema violation leaves that batch's
//! sources exactly as they were and moves on to the next batch.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::ai::schema::strict_schema;
use crate::error::{DiscoveryError, Result};
use crate::pipeline::prompts::build_triage_prompt;
use crate::traits::generator::{GenerationRequest, TaskType, TextGenerator};
use crate::types::config::TriageConfig;
use crate::types::race::RaceMetadata;
use crate::types::source::Source;

/// Weight of the heuristic score in the blend.
pub const BASE_WEIGHT: f32 = 0.6;

/// Weight of the model priority in the blend.
pub const PRIORITY_WEIGHT: f32 = 0.4;

/// Fraction of the drop threshold below which a source is dropped even
/// when the model did not ask to keep it.
pub const SOFT_FLOOR_FACTOR: f32 = 0.6;

/// Score floor for sources the model calls official.
pub const TRIAGE_OFFICIAL_FLOOR: f32 = 0.98;

/// Model-assigned category for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TriageCategory {
    Campaign,
    Gov,
    News,
    Social,
    Blog,
    Spam,
    Other,
}

impl TriageCategory {
    /// Apply this category's floor (or, for spam, cap) to a heuristic score.
    pub fn adjust_base(&self, base: f32) -> f32 {
        match self {
            Self::Campaign => base.max(0.85),
            Self::Gov => base.max(0.8),
            Self::News => base.max(0.65),
            Self::Social => base.max(0.6),
            Self::Spam => base.min(0.2),
            Self::Blog | Self::Other => base,
        }
    }
}

/// One model annotation, addressed by local batch index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriageItem {
    /// Index of the source within its batch, from 0.
    pub i: usize,
    pub keep: bool,
    /// Usefulness in `[0, 1]`.
    pub priority: f32,
    pub category: TriageCategory,
    /// The source is a candidate's own campaign website.
    pub official: bool,
    pub notes: Option<String>,
}

/// Response contract for one triage call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TriageResponse {
    pub items: Vec<TriageItem>,
}

impl TriageResponse {
    /// Decode and validate a raw structured response.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let response: Self = serde_json::from_value(value)?;

        for item in &response.items {
            if !item.priority.is_finite() || !(0.0..=1.0).contains(&item.priority) {
                return Err(DiscoveryError::Schema {
                    reason: format!("priority {} out of range for item {}", item.priority, item.i),
                });
            }
        }

        Ok(response)
    }
}

/// Result of triaging a source list.
#[derive(Debug, Clone, Default)]
pub struct TriageOutcome {
    /// Retained sources, in input order.
    pub sources: Vec<Source>,
    pub batches: usize,
    pub failed_batches: usize,
    pub annotated: usize,
    pub dropped: usize,
}

/// Triage `sources` in batches of `config.batch_size`.
///
/// With triage disabled, the sources come back untouched.
pub async fn triage_sources<G>(
    generator: &G,
    sources: Vec<Source>,
    race: Option<&RaceMetadata>,
    config: &TriageConfig,
) -> TriageOutcome
where
    G: TextGenerator + ?Sized,
{
    if !config.enabled || sources.is_empty() {
        return TriageOutcome {
            sources,
            ..Default::default()
        };
    }

    let batch_size = config.batch_size.max(1);
    let schema = strict_schema::<TriageResponse>();
    let mut outcome = TriageOutcome {
        sources: Vec::with_capacity(sources.len()),
        ..Default::default()
    };

    info!(
        sources = sources.len(),
        batch_size,
        generator = generator.name(),
        "Triaging sources"
    );

    let mut remaining = sources.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<Source> = remaining.by_ref().take(batch_size).collect();
        let batch_index = outcome.batches;
        outcome.batches += 1;

        let request = GenerationRequest {
            task_type: TaskType::SourceTriage,
            prompt: build_triage_prompt(race, &batch),
            response_schema: schema.clone(),
            max_tokens: config.max_tokens,
            allow_repair: config.allow_repair,
        };

        let response = match generator.generate_structured(&request).await {
            Ok(value) => TriageResponse::from_value(value),
            Err(e) => Err(e),
        };

        match response {
            Ok(response) => {
                let applied = apply_annotations(batch, &response, config.drop_threshold);
                outcome.annotated += applied.annotated;
                outcome.dropped += applied.dropped;
                outcome.sources.extend(applied.kept);
            }
            Err(e) => {
                warn!(
                    batch = batch_index,
                    size = batch.len(),
                    error = %e,
                    "Triage failed for batch, passing sources through"
                );
                outcome.failed_batches += 1;
                outcome.sources.extend(batch);
            }
        }
    }

    info!(
        batches = outcome.batches,
        failed_batches = outcome.failed_batches,
        annotated = outcome.annotated,
        dropped = outcome.dropped,
        "Triage completed"
    );

    outcome
}

struct AppliedBatch {
    kept: Vec<Source>,
    annotated: usize,
    dropped: usize,
}

fn apply_annotations(
    batch: Vec<Source>,
    response: &TriageResponse,
    drop_threshold: f32,
) -> AppliedBatch {
    let mut by_index: HashMap<usize, &TriageItem> = HashMap::with_capacity(response.items.len());
    for item in &response.items {
        if item.i >= batch.len() {
            warn!(index = item.i, batch_size = batch.len(), "Ignoring triage item out of range");
            continue;
        }
        by_index.entry(item.i).or_insert(item);
    }

    let mut applied = AppliedBatch {
        kept: Vec::with_capacity(batch.len()),
        annotated: 0,
        dropped: 0,
    };

    for (i, mut source) in batch.into_iter().enumerate() {
        let Some(item) = by_index.get(&i) else {
            debug!(url = %source.url, index = i, "No triage annotation, keeping as is");
            applied.kept.push(source);
            continue;
        };

        applied.annotated += 1;
        if annotate(&mut source, item, drop_threshold) {
            applied.kept.push(source);
        } else {
            debug!(
                url = %source.url,
                score = source.score,
                category = ?item.category,
                "Dropped by triage"
            );
            applied.dropped += 1;
        }
    }

    applied
}

/// Blend the annotation into `source`. Returns whether to retain it.
///
/// Retained if the model wants it and the score clears `drop_threshold`,
/// or, regardless of the model, if the score clears
/// `SOFT_FLOOR_FACTOR * drop_threshold`.
fn annotate(source: &mut Source, item: &TriageItem, drop_threshold: f32) -> bool {
    let base = item.category.adjust_base(source.score);
    source.set_score(BASE_WEIGHT * base + PRIORITY_WEIGHT * item.priority);

    if item.official {
        source.mark_official(TRIAGE_OFFICIAL_FLOOR);
    }

    (item.keep && source.score >= drop_threshold)
        || source.score >= SOFT_FLOOR_FACTOR * drop_threshold
}
