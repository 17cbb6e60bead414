pub mod record;
pub mod segmenter;

pub use record::HerbRecord;
pub use segmenter::Segmenter;

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

/// Segment a raw pharmacopeia text file into herb records.
pub async fn segment_file(path: &Path) -> Result<Vec<HerbRecord>> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read corpus file: {:?}", path))?;

    let segmenter = Segmenter::new();
    Ok(segmenter.segment(&content))
}

/// Persist segmented records as a single JSON array.
pub async fn write_records(path: &Path, records: &[HerbRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write records to {:?}", path))?;
    Ok(())
}

/// Load a previously segmented record collection.
pub async fn load_records(path: &Path) -> Result<Vec<HerbRecord>> {
    let json = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read records file: {:?}", path))?;
    let records: Vec<HerbRecord> =
        serde_json::from_str(&json).context("Records file is not a JSON array of herb records")?;
    Ok(records)
}
