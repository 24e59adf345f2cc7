//! Commit synchronization
//!
//! Mirrors commits and their parent edges per configured repository.
//! Rows are append-only: records already present are skipped, and a parent
//! referenced by an edge but absent from the store (older than the sync
//! window) is skipped quietly; the graph walks tolerate the truncation.

use chrono::Utc;
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument, warn};

use crate::error::EngineError;
use crate::repositories::{
    CommitParentRepository, CommitRepository, RepositoryConfigRepository, WatermarkStore,
};
use crate::sync::parse_owner_name;
use crate::sync::sources::CommitSource;

/// Counters from one commit sync pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CommitSyncStats {
    pub commits_created: usize,
    pub edges_created: usize,
    pub records_failed: usize,
    pub repositories_skipped: usize,
}

pub struct CommitSync<'a> {
    db: &'a DatabaseConnection,
    source: &'a dyn CommitSource,
    lookback_days: u32,
}

impl<'a> CommitSync<'a> {
    pub fn new(db: &'a DatabaseConnection, source: &'a dyn CommitSource, lookback_days: u32) -> Self {
        Self {
            db,
            source,
            lookback_days,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<CommitSyncStats, EngineError> {
        let configs = RepositoryConfigRepository::new(self.db).find_all().await?;
        if configs.is_empty() {
            warn!("No repositories configured for commit synchronization");
            return Ok(CommitSyncStats::default());
        }

        let watermarks = WatermarkStore::new(self.db);
        let mut stats = CommitSyncStats::default();

        for config in configs {
            let Some((owner, name)) = parse_owner_name(&config.url) else {
                warn!(url = %config.url, "Repository URL cannot be parsed into owner/name; skipping");
                stats.repositories_skipped += 1;
                continue;
            };

            let job = format!("commit_sync:{owner}/{name}");
            let since = watermarks.since(&job, self.lookback_days).await?;

            let records = match self.source.commits_since(&owner, &name, since).await {
                Ok(records) => records,
                Err(err) => {
                    // The fetch itself failed: abandon this repository for
                    // the pass and leave its watermark so the next run
                    // retries the same window.
                    error!(repository = %config.url, error = %err, "Commit fetch failed");
                    counter!("commit_sync_upstream_failures_total").increment(1);
                    continue;
                }
            };

            debug!(repository = %config.url, records = records.len(), "Fetched commit records");

            let commits = CommitRepository::new(self.db);
            let edges = CommitParentRepository::new(self.db);

            // First pass: commits that are not stored yet.
            for record in &records {
                match commits.exists(&record.sha).await {
                    Ok(true) => {}
                    Ok(false) => {
                        match commits
                            .insert(
                                config.id,
                                &record.sha,
                                &record.author,
                                &record.message,
                                record.authored_at,
                            )
                            .await
                        {
                            Ok(_) => stats.commits_created += 1,
                            Err(err) => {
                                error!(sha = %record.sha, error = %err, "Failed to persist commit");
                                stats.records_failed += 1;
                            }
                        }
                    }
                    Err(err) => {
                        error!(sha = %record.sha, error = %err, "Failed to check commit existence");
                        stats.records_failed += 1;
                    }
                }
            }

            // Second pass: parent edges, once both endpoints are stored.
            for record in &records {
                for parent_sha in &record.parent_shas {
                    match commits.exists(parent_sha).await {
                        Ok(false) => {
                            // Parent older than the sync window.
                            debug!(
                                child = %record.sha,
                                parent = %parent_sha,
                                "Parent commit not stored; skipping edge"
                            );
                            continue;
                        }
                        Err(err) => {
                            error!(parent = %parent_sha, error = %err, "Failed to check parent existence");
                            stats.records_failed += 1;
                            continue;
                        }
                        Ok(true) => {}
                    }

                    match edges.exists(&record.sha, parent_sha).await {
                        Ok(true) => continue,
                        Ok(false) => {}
                        Err(err) => {
                            error!(child = %record.sha, error = %err, "Failed to check edge existence");
                            stats.records_failed += 1;
                            continue;
                        }
                    }

                    match edges.insert(config.id, &record.sha, parent_sha).await {
                        Ok(_) => stats.edges_created += 1,
                        Err(err) => {
                            error!(child = %record.sha, parent = %parent_sha, error = %err, "Failed to persist edge");
                            stats.records_failed += 1;
                        }
                    }
                }
            }

            // Per-record failures do not hold the watermark back; only an
            // upstream fetch failure does.
            if let Err(err) = watermarks.advance(&job, Utc::now()).await {
                error!(job = %job, error = %err, "Failed to advance watermark");
            }
        }

        counter!("commit_sync_commits_created_total").increment(stats.commits_created as u64);
        counter!("commit_sync_edges_created_total").increment(stats.edges_created as u64);

        info!(
            commits = stats.commits_created,
            edges = stats.edges_created,
            failed = stats.records_failed,
            "Commit sync pass completed"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::sources::{CommitRecord, SourceError};
    use crate::test_support::{insert_repository, test_db};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    struct FakeCommitSource {
        records: Vec<CommitRecord>,
        fail: bool,
    }

    #[async_trait]
    impl CommitSource for FakeCommitSource {
        async fn commits_since(
            &self,
            _owner: &str,
            _name: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<CommitRecord>, SourceError> {
            if self.fail {
                return Err(SourceError::Upstream {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            Ok(self.records.clone())
        }
    }

    fn record(sha: &str, parents: &[&str]) -> CommitRecord {
        CommitRecord {
            sha: sha.to_string(),
            author: "alice".to_string(),
            message: format!("commit {sha}"),
            authored_at: Utc::now() - Duration::days(1),
            parent_shas: parents.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn mirrors_commits_and_edges_and_advances_watermark() {
        let db = test_db().await;
        insert_repository(&db, "https://github.com/acme/api", None).await;

        let source = FakeCommitSource {
            records: vec![record("c1", &[]), record("c2", &["c1"])],
            fail: false,
        };

        let stats = CommitSync::new(&db, &source, 30).run().await.unwrap();
        assert_eq!(stats.commits_created, 2);
        assert_eq!(stats.edges_created, 1);

        // Watermark moved to roughly now; a rerun sees nothing new.
        let since = WatermarkStore::new(&db)
            .since("commit_sync:acme/api", 30)
            .await
            .unwrap();
        assert!((Utc::now() - since).num_seconds() < 5);

        let stats = CommitSync::new(&db, &source, 30).run().await.unwrap();
        assert_eq!(stats.commits_created, 0);
        assert_eq!(stats.edges_created, 0);
    }

    #[tokio::test]
    async fn missing_parents_truncate_edges_quietly() {
        let db = test_db().await;
        insert_repository(&db, "https://github.com/acme/api", None).await;

        // c2's parent c1 is older than the window and never arrives.
        let source = FakeCommitSource {
            records: vec![record("c2", &["c1"])],
            fail: false,
        };

        let stats = CommitSync::new(&db, &source, 30).run().await.unwrap();
        assert_eq!(stats.commits_created, 1);
        assert_eq!(stats.edges_created, 0);
        assert_eq!(stats.records_failed, 0);
    }

    #[tokio::test]
    async fn upstream_failure_leaves_watermark_untouched() {
        let db = test_db().await;
        insert_repository(&db, "https://github.com/acme/api", None).await;

        let source = FakeCommitSource {
            records: Vec::new(),
            fail: true,
        };

        let stats = CommitSync::new(&db, &source, 30).run().await.unwrap();
        assert_eq!(stats, CommitSyncStats::default());

        // First-run lookback still applies: nothing was recorded.
        let since = WatermarkStore::new(&db)
            .since("commit_sync:acme/api", 30)
            .await
            .unwrap();
        assert!((Utc::now() - since).num_days() >= 29);
    }

    #[tokio::test]
    async fn malformed_repository_url_is_skipped() {
        let db = test_db().await;
        insert_repository(&db, "https://github.com/just-owner", None).await;

        let source = FakeCommitSource {
            records: vec![record("c1", &[])],
            fail: false,
        };

        let stats = CommitSync::new(&db, &source, 30).run().await.unwrap();
        assert_eq!(stats.repositories_skipped, 1);
        assert_eq!(stats.commits_created, 0);
    }
}
