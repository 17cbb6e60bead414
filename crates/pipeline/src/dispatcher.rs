use anyhow::Result;
use extract::{ExtractionService, GraphFragment};
use ingest::HerbRecord;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::log::FragmentLog;

pub const DEFAULT_WORKERS: usize = 32;

/// Outcome counts for one extraction run. Observability only: the log
/// itself is the source of truth for what got done.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

/// Fans pending records out across a bounded worker pool.
///
/// Workers are unordered: whichever record finishes first is appended
/// first. A record whose extraction exhausted its retries gets no log
/// line at all, so the next full run picks it up again.
pub struct Dispatcher {
    service: Arc<dyn ExtractionService>,
    workers: usize,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn ExtractionService>) -> Self {
        Self {
            service,
            workers: DEFAULT_WORKERS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub async fn run(&self, records: Vec<HerbRecord>, log: Arc<FragmentLog>) -> Result<RunSummary> {
        let total = records.len();
        info!(total, workers = self.workers, "starting extraction run");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks: JoinSet<bool> = JoinSet::new();

        for record in records {
            // Acquiring here bounds in-flight work without bounding the
            // spawn loop's memory on anything but the record list itself.
            let permit = Arc::clone(&semaphore).acquire_owned().await?;
            let service = Arc::clone(&self.service);
            let log = Arc::clone(&log);

            tasks.spawn(async move {
                let _permit = permit;
                match service.extract(&record.content).await {
                    Ok(graph) => {
                        let fragment = GraphFragment::new(record.name.clone(), graph);
                        match log.append(&fragment).await {
                            Ok(()) => true,
                            Err(e) => {
                                error!(name = %record.name, error = %e, "failed to append fragment");
                                false
                            }
                        }
                    }
                    Err(e) => {
                        warn!(name = %record.name, error = %e, "record stays pending for the next run");
                        false
                    }
                }
            });
        }

        let mut summary = RunSummary {
            total,
            ..Default::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(true) => summary.succeeded += 1,
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!(error = %e, "extraction worker panicked");
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total = summary.total,
            "extraction run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint;
    use async_trait::async_trait;
    use extract::{ExtractError, RawGraph};
    use std::collections::HashSet;

    /// Deterministic stand-in for the model: succeeds with a one-node
    /// graph named after the record, fails for configured names.
    struct MockService {
        fail_for: HashSet<String>,
    }

    impl MockService {
        fn new<const N: usize>(fail_for: [&str; N]) -> Self {
            Self {
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl ExtractionService for MockService {
        async fn extract(&self, text: &str) -> Result<RawGraph, ExtractError> {
            // Let the scheduler interleave workers.
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            let name = text.lines().next().unwrap_or_default();
            if self.fail_for.contains(name) {
                return Err(ExtractError::MissingContent);
            }
            Ok(RawGraph {
                nodes: vec![serde_json::json!({"id": name, "label": "药物"})],
                edges: vec![],
            })
        }
    }

    fn records(n: usize) -> Vec<HerbRecord> {
        (0..n)
            .map(|i| {
                HerbRecord::new(format!("药材{}", i), "pinyin".to_string(), "LATIN".to_string())
            })
            .collect()
    }

    async fn log_lines(path: &std::path::Path) -> Vec<GraphFragment> {
        let contents = tokio::fs::read_to_string(path).await.unwrap();
        contents
            .lines()
            .map(|l| serde_json::from_str(l).expect("every log line must parse on its own"))
            .collect()
    }

    #[tokio::test]
    async fn concurrent_appends_never_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let log = Arc::new(FragmentLog::open(&path).await.unwrap());

        let dispatcher = Dispatcher::new(Arc::new(MockService::new([]))).with_workers(8);
        let summary = dispatcher.run(records(50), log).await.unwrap();

        assert_eq!(summary.succeeded, 50);
        assert_eq!(summary.failed, 0);

        let fragments = log_lines(&path).await;
        assert_eq!(fragments.len(), 50);

        let names: HashSet<_> = fragments.iter().map(|f| f.source_name.clone()).collect();
        assert_eq!(names.len(), 50, "no duplicate source_name entries");
    }

    #[tokio::test]
    async fn failures_leave_no_line_and_resume_fills_the_gap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        // First run: two records keep failing.
        let log = Arc::new(FragmentLog::open(&path).await.unwrap());
        let flaky = Arc::new(MockService::new(["药材3", "药材7"]));
        let summary = Dispatcher::new(flaky)
            .with_workers(4)
            .run(records(10), log)
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 8);
        assert_eq!(summary.failed, 2);

        for fragment in log_lines(&path).await {
            assert_ne!(fragment.source_name, "药材3");
            assert_ne!(fragment.source_name, "药材7");
        }

        // Resume: only the two gap records are pending.
        let done = checkpoint::completed_names(&path).await.unwrap();
        let remaining = checkpoint::pending(records(10), &done);
        let names: Vec<_> = remaining.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["药材3", "药材7"]);

        // Second run with a healthy service completes the log exactly once.
        let log = Arc::new(FragmentLog::open(&path).await.unwrap());
        let summary = Dispatcher::new(Arc::new(MockService::new([])))
            .with_workers(4)
            .run(remaining, log)
            .await
            .unwrap();
        assert_eq!(summary.succeeded, 2);

        let fragments = log_lines(&path).await;
        assert_eq!(fragments.len(), 10);
        let names: HashSet<_> = fragments.iter().map(|f| f.source_name.clone()).collect();
        assert_eq!(names.len(), 10);
    }

    #[tokio::test]
    async fn rerun_over_complete_log_has_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let log = Arc::new(FragmentLog::open(&path).await.unwrap());
        Dispatcher::new(Arc::new(MockService::new([])))
            .with_workers(4)
            .run(records(5), log)
            .await
            .unwrap();

        let done = checkpoint::completed_names(&path).await.unwrap();
        assert!(checkpoint::pending(records(5), &done).is_empty());
    }
}
