//! Deployment synchronization
//!
//! Mirrors successful workflow runs as deployments, then hands the pass to
//! the attribution engine so freshly landed deployments get their lead-time
//! facts in the same sweep. Runs on the main branch map to the production
//! environment.

use chrono::Utc;
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument, warn};

use crate::engine::attribution::LeadTimeAttributor;
use crate::error::EngineError;
use crate::repositories::{DeploymentRepository, RepositoryConfigRepository, WatermarkStore};
use crate::sync::parse_owner_name;
use crate::sync::sources::DeploymentSource;

const PRODUCTION_BRANCH: &str = "main";
const PRODUCTION_ENVIRONMENT: &str = "production";

/// Counters from one deployment sync pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DeploymentSyncStats {
    pub deployments_created: usize,
    pub records_skipped: usize,
    pub records_failed: usize,
    pub facts_created: usize,
}

pub struct DeploymentSync<'a> {
    db: &'a DatabaseConnection,
    source: &'a dyn DeploymentSource,
    lookback_days: u32,
    environment: &'a str,
}

impl<'a> DeploymentSync<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        source: &'a dyn DeploymentSource,
        lookback_days: u32,
        environment: &'a str,
    ) -> Self {
        Self {
            db,
            source,
            lookback_days,
            environment,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<DeploymentSyncStats, EngineError> {
        let configs = RepositoryConfigRepository::new(self.db).find_all().await?;
        if configs.is_empty() {
            warn!("No repositories configured for deployment synchronization");
            return Ok(DeploymentSyncStats::default());
        }

        let watermarks = WatermarkStore::new(self.db);
        let deployments = DeploymentRepository::new(self.db);
        let mut stats = DeploymentSyncStats::default();

        for config in configs {
            let Some((owner, name)) = parse_owner_name(&config.url) else {
                warn!(url = %config.url, "Repository URL cannot be parsed into owner/name; skipping");
                continue;
            };
            let Some(workflow) = config.deployment_workflow.as_deref() else {
                warn!(url = %config.url, "No deployment workflow configured; skipping");
                continue;
            };

            let job = format!("deployment_sync:{owner}/{name}");
            let since = watermarks.since(&job, self.lookback_days).await?;

            let runs = match self.source.runs_since(&owner, &name, workflow, since).await {
                Ok(runs) => runs,
                Err(err) => {
                    error!(repository = %config.url, error = %err, "Deployment fetch failed");
                    counter!("deployment_sync_upstream_failures_total").increment(1);
                    continue;
                }
            };

            debug!(repository = %config.url, records = runs.len(), "Fetched deployment runs");

            for run in runs {
                if run.conclusion.as_deref() != Some("success") {
                    stats.records_skipped += 1;
                    continue;
                }
                if run.sha.trim().is_empty() {
                    warn!(
                        external_id = run.external_id,
                        "Deployment run has no commit sha; skipping"
                    );
                    stats.records_skipped += 1;
                    continue;
                }

                match deployments.find_by_external_id(run.external_id).await {
                    Ok(Some(_)) => {}
                    Ok(None) => {
                        let environment = (run.head_branch == PRODUCTION_BRANCH)
                            .then_some(PRODUCTION_ENVIRONMENT);
                        let result = deployments
                            .insert(
                                run.external_id,
                                config.id,
                                run.name.as_deref(),
                                &run.sha,
                                environment,
                                config.service_name.as_deref(),
                                run.created_at,
                                run.updated_at,
                            )
                            .await;
                        match result {
                            Ok(_) => stats.deployments_created += 1,
                            Err(err) => {
                                error!(
                                    external_id = run.external_id,
                                    error = %err,
                                    "Failed to persist deployment"
                                );
                                stats.records_failed += 1;
                            }
                        }
                    }
                    Err(err) => {
                        error!(external_id = run.external_id, error = %err, "Failed to look up deployment");
                        stats.records_failed += 1;
                    }
                }
            }

            if let Err(err) = watermarks.advance(&job, Utc::now()).await {
                error!(job = %job, error = %err, "Failed to advance watermark");
            }
        }

        // New deployments feed straight into attribution so the facts land
        // in the same sweep.
        if stats.deployments_created > 0 {
            let outcome = LeadTimeAttributor::new(self.db, self.environment).run().await?;
            stats.facts_created = outcome.facts_created;
        }

        counter!("deployment_sync_created_total").increment(stats.deployments_created as u64);

        info!(
            created = stats.deployments_created,
            skipped = stats.records_skipped,
            failed = stats.records_failed,
            facts = stats.facts_created,
            "Deployment sync pass completed"
        );

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::LeadTimeRepository;
    use crate::sync::sources::{DeploymentRecord, SourceError};
    use crate::test_support::{insert_commit, insert_repository, test_db};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};
    use sea_orm::{ActiveModelTrait, Set};

    struct FakeDeploymentSource {
        runs: Vec<DeploymentRecord>,
    }

    #[async_trait]
    impl DeploymentSource for FakeDeploymentSource {
        async fn runs_since(
            &self,
            _owner: &str,
            _name: &str,
            _workflow: &str,
            _since: DateTime<Utc>,
        ) -> Result<Vec<DeploymentRecord>, SourceError> {
            Ok(self.runs.clone())
        }
    }

    fn run(external_id: i64, sha: &str, branch: &str, conclusion: Option<&str>) -> DeploymentRecord {
        let t = Utc::now() - Duration::hours(1);
        DeploymentRecord {
            external_id,
            name: Some("deploy".to_string()),
            head_branch: branch.to_string(),
            sha: sha.to_string(),
            conclusion: conclusion.map(str::to_string),
            created_at: t,
            updated_at: t,
        }
    }

    #[tokio::test]
    async fn successful_main_runs_become_production_deployments_and_get_attributed() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", Some("checkout")).await;
        insert_commit(&db, &repo, "abc", "alice", Utc::now() - Duration::days(1)).await;

        let source = FakeDeploymentSource {
            runs: vec![
                run(1, "abc", "main", Some("success")),
                // Failed run and feature-branch run are not deployments.
                run(2, "def", "main", Some("failure")),
                run(3, "abc", "feature/x", Some("success")),
                // Blank sha is skipped rather than fabricated.
                run(4, "  ", "main", Some("success")),
            ],
        };

        let stats = DeploymentSync::new(&db, &source, 30, "production").run().await.unwrap();
        // The feature-branch run is stored without an environment, so only
        // the main run is attributed.
        assert_eq!(stats.deployments_created, 2);
        assert_eq!(stats.records_skipped, 2);
        assert_eq!(stats.facts_created, 1);

        let deployment = DeploymentRepository::new(&db)
            .find_by_external_id(1)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(deployment.environment.as_deref(), Some("production"));
        assert_eq!(deployment.service_name.as_deref(), Some("checkout"));
        assert!(deployment.lead_time_processed);

        let feature_run = DeploymentRepository::new(&db)
            .find_by_external_id(3)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(feature_run.environment, None);
        assert!(!feature_run.lead_time_processed);

        assert_eq!(LeadTimeRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn rerun_does_not_duplicate_deployments_or_facts() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", None).await;
        insert_commit(&db, &repo, "abc", "alice", Utc::now() - Duration::days(1)).await;

        let source = FakeDeploymentSource {
            runs: vec![run(1, "abc", "main", Some("success"))],
        };

        let sync = DeploymentSync::new(&db, &source, 30, "production");
        sync.run().await.unwrap();
        let second = sync.run().await.unwrap();

        assert_eq!(second.deployments_created, 0);
        assert_eq!(second.facts_created, 0);
        assert_eq!(LeadTimeRepository::new(&db).count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn repository_without_workflow_is_skipped() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", None).await;
        let mut active: crate::models::repository::ActiveModel = repo.into();
        active.deployment_workflow = Set(None);
        active.update(&db).await.unwrap();

        let source = FakeDeploymentSource {
            runs: vec![run(1, "abc", "main", Some("success"))],
        };

        let stats = DeploymentSync::new(&db, &source, 30, "production").run().await.unwrap();
        assert_eq!(stats, DeploymentSyncStats::default());
    }
}
