use anyhow::{Context, Result};
use extract::GraphFragment;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only JSONL log shared by all extraction workers.
///
/// Line-by-line parseability is what makes resumption correct, so every
/// append goes through one mutex and lands as a single `write_all` of a
/// complete line. Fragments are never rewritten or deleted.
pub struct FragmentLog {
    file: Mutex<File>,
}

impl FragmentLog {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open output log: {:?}", path))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Durably record one completed extraction.
    pub async fn append(&self, fragment: &GraphFragment) -> Result<()> {
        // serde_json never emits raw newlines inside a compact object.
        let mut line = serde_json::to_vec(fragment).context("Failed to serialize fragment")?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await.context("Failed to append to output log")?;
        file.flush().await.context("Failed to flush output log")?;
        Ok(())
    }
}
