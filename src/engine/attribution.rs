//! Deployment attribution
//!
//! Walks the commit ancestry graph to attribute each newly observed
//! deployment the set of commits it first shipped, relative to the
//! deployment that preceded it in the same repository and environment, and
//! materializes one lead-time fact per attributed commit.
//!
//! Deployments are processed strictly in creation order: earlier
//! deployments must establish their boundary before later ones build on
//! it. Each deployment's facts and its processed flag are committed in one
//! transaction, so a crash between steps cannot double-process: rerunning
//! before the flag persists redoes the same deterministic computation, and
//! after it persists the deployment is skipped.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use metrics::counter;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::engine::graph::CommitGraph;
use crate::error::EngineError;
use crate::models::{deployment, lead_time_fact};
use crate::repositories::{CommitParentRepository, CommitRepository, DeploymentRepository};

/// Counters from one attribution pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AttributionOutcome {
    pub deployments_processed: usize,
    pub facts_created: usize,
}

/// One pass of lead-time attribution over unprocessed deployments.
pub struct LeadTimeAttributor<'a> {
    db: &'a DatabaseConnection,
    environment: &'a str,
}

impl<'a> LeadTimeAttributor<'a> {
    pub fn new(db: &'a DatabaseConnection, environment: &'a str) -> Self {
        Self { db, environment }
    }

    #[instrument(skip(self), fields(environment = self.environment))]
    pub async fn run(&self) -> Result<AttributionOutcome, EngineError> {
        let deployments = DeploymentRepository::new(self.db);
        let unprocessed = deployments.find_unprocessed(self.environment).await?;

        if unprocessed.is_empty() {
            debug!("No unprocessed deployments found");
            return Ok(AttributionOutcome::default());
        }

        info!(
            count = unprocessed.len(),
            "Attributing unprocessed deployments"
        );

        let mut outcome = AttributionOutcome::default();
        // Commits are append-only, so one graph load per repository serves
        // the whole pass.
        let mut graphs: HashMap<i64, CommitGraph> = HashMap::new();

        for current in unprocessed {
            let graph = match graphs.entry(current.repository_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(entry) => {
                    let graph = self.load_graph(current.repository_id).await?;
                    entry.insert(graph)
                }
            };

            let facts = self.attribute(graph, &current).await?;
            outcome.facts_created += facts;
            outcome.deployments_processed += 1;
        }

        counter!("attribution_deployments_processed_total")
            .increment(outcome.deployments_processed as u64);
        counter!("attribution_facts_created_total").increment(outcome.facts_created as u64);

        info!(
            deployments = outcome.deployments_processed,
            facts = outcome.facts_created,
            "Attribution pass completed"
        );

        Ok(outcome)
    }

    async fn load_graph(&self, repository_id: i64) -> Result<CommitGraph, EngineError> {
        let commits = CommitRepository::new(self.db)
            .find_by_repository(repository_id)
            .await?;
        let edges = CommitParentRepository::new(self.db)
            .find_by_repository(repository_id)
            .await?;
        Ok(CommitGraph::from_rows(commits, edges))
    }

    /// Attribute one deployment and persist its facts together with the
    /// processed flag. Returns the number of facts created.
    async fn attribute(
        &self,
        graph: &CommitGraph,
        current: &deployment::Model,
    ) -> Result<usize, EngineError> {
        let deployments = DeploymentRepository::new(self.db);

        let previous = deployments
            .find_previous(current.repository_id, self.environment, current.created_at)
            .await?;

        let boundary = previous
            .as_ref()
            .map(|prev| graph.ancestor_closure(&prev.sha))
            .unwrap_or_default();

        let attributed = graph.ancestors_outside(&current.sha, &boundary);

        if !graph.contains(&current.sha) {
            // Shipped commit never landed in the mirror; mark the
            // deployment processed without fabricating lead time.
            warn!(
                deployment_id = current.id,
                sha = %current.sha,
                "Deployment commit not found in store; marking processed with no facts"
            );
        }

        let deployed_at = current.created_at.with_timezone(&chrono::Utc);
        let fact_count = attributed.len();

        let txn = self.db.begin().await?;

        for node in attributed {
            let lead_time_seconds = (deployed_at - node.authored_at).num_seconds();
            if lead_time_seconds < 0 {
                warn!(
                    deployment_id = current.id,
                    commit_sha = %node.sha,
                    lead_time_seconds,
                    "Negative lead time; clock skew or misordered sync upstream"
                );
                counter!("attribution_negative_lead_time_total").increment(1);
            }

            let fact = lead_time_fact::ActiveModel {
                commit_sha: Set(node.sha.clone()),
                deployment_id: Set(current.id),
                lead_time_seconds: Set(lead_time_seconds),
                ..Default::default()
            };
            fact.insert(&txn).await?;
        }

        let mut active: deployment::ActiveModel = current.clone().into();
        active.lead_time_processed = Set(true);
        active.update(&txn).await?;

        txn.commit().await?;

        debug!(
            deployment_id = current.id,
            facts = fact_count,
            boundary = boundary.len(),
            "Deployment attributed"
        );

        Ok(fact_count)
    }
}
