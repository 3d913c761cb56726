//! Race metadata provider trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::race::RaceMetadata;

/// Supplies structured metadata for a race, when the upstream extraction
/// step has produced any.
#[async_trait]
pub trait RaceMetadataProvider: Send + Sync {
    /// `Ok(None)` means no metadata exists for this race.
    async fn race_metadata(&self, race_id: &str) -> Result<Option<RaceMetadata>>;
}
