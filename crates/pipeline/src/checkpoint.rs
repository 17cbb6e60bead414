use anyhow::{Context, Result};
use ingest::HerbRecord;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Minimal view of one output-log line; extra fields are ignored.
#[derive(Deserialize)]
struct LogLine {
    source_name: String,
}

/// Recover the checkpoint set from an existing output log.
///
/// Each line is parsed independently; a corrupt line (e.g. from a crash
/// mid-write on a non-atomic filesystem) is reported and skipped so the
/// scan never aborts. A missing log means a fresh run.
pub async fn completed_names(log_path: &Path) -> Result<HashSet<String>> {
    let mut done = HashSet::new();

    if !fs::try_exists(log_path).await.unwrap_or(false) {
        return Ok(done);
    }

    let contents = fs::read_to_string(log_path)
        .await
        .with_context(|| format!("Failed to read output log: {:?}", log_path))?;

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LogLine>(line) {
            Ok(entry) => {
                done.insert(entry.source_name);
            }
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping unparseable log line");
            }
        }
    }

    info!(completed = done.len(), "recovered checkpoint from output log");
    Ok(done)
}

/// Filter out records that already have a log line, preserving input order.
pub fn pending(records: Vec<HerbRecord>, done: &HashSet<String>) -> Vec<HerbRecord> {
    records
        .into_iter()
        .filter(|record| !done.contains(&record.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(name: &str) -> HerbRecord {
        HerbRecord::new(name.to_string(), "pinyin".to_string(), "LATIN".to_string())
    }

    #[tokio::test]
    async fn missing_log_means_everything_pending() {
        let dir = tempfile::tempdir().unwrap();
        let done = completed_names(&dir.path().join("absent.jsonl")).await.unwrap();
        assert!(done.is_empty());

        let records = vec![record("甘草"), record("丁香")];
        assert_eq!(pending(records, &done).len(), 2);
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, r#"{{"source_name":"甘草","nodes":[],"edges":[]}}"#).unwrap();
        writeln!(f, r#"{{"source_name":"丁香","nodes":["#).unwrap();
        writeln!(f, r#"{{"source_name":"人参","nodes":[],"edges":[]}}"#).unwrap();

        let done = completed_names(&path).await.unwrap();
        assert_eq!(done.len(), 2);
        assert!(done.contains("甘草"));
        assert!(done.contains("人参"));
        assert!(!done.contains("丁香"));
    }

    #[tokio::test]
    async fn pending_preserves_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "{\"source_name\":\"丁香\"}\n").unwrap();

        let done = completed_names(&path).await.unwrap();
        let remaining = pending(vec![record("甘草"), record("丁香"), record("人参")], &done);

        let names: Vec<_> = remaining.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["甘草", "人参"]);
    }
}
