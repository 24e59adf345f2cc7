//! Entity-scoped DORA aggregate
//!
//! One parameterized aggregator serves every reporting entity: an
//! individual (one author), a team (its members' authors), or the whole
//! organization. The author set is the only axis those roles differ on.
//! Given a commit filter it produces lead-time statistics, deployment and
//! failure counts, MTTR statistics, pull-request statistics, and a merged
//! daily time series.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::correlation::{DEFAULT_CORRELATION_WINDOW_HOURS, failed_deployment_ids};
use crate::engine::graph::ChildIndex;
use crate::error::EngineError;
use crate::models::incident::IncidentState;
use crate::models::{commit, deployment, incident, lead_time_fact};
use crate::repositories::{
    CommitParentRepository, CommitRepository, IncidentRepository, LeadTimeRepository,
    PullRequestRepository, RepositoryConfigRepository,
};

const MERGE_MESSAGE_PREFIXES: [&str; 3] = [
    "merge pull request",
    "merge branch",
    "merge remote-tracking branch",
];

/// Commit filter defining the reporting entity and its optional scoping.
#[derive(Debug, Clone, Default)]
pub struct MetricsQuery {
    /// Author identities owning the commits (matched case-insensitively).
    pub authors: Vec<String>,
    /// Keep only commits shipped by a deployment on/after this date.
    pub start_date: Option<NaiveDate>,
    /// Keep only commits shipped by a deployment on/before this date.
    pub end_date: Option<NaiveDate>,
    /// Keep only commits shipped into these repositories (empty = all).
    pub repository_ids: Vec<i64>,
}

impl MetricsQuery {
    pub fn for_author(author: impl Into<String>) -> Self {
        Self {
            authors: vec![author.into()],
            ..Default::default()
        }
    }

    pub fn for_authors<I, S>(authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            authors: authors.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    fn is_unfiltered(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none() && self.repository_ids.is_empty()
    }

    fn deployment_matches(&self, deployment: &deployment::Model) -> bool {
        let deployed_on = deployment.created_at.with_timezone(&Utc).date_naive();
        if let Some(start) = self.start_date {
            if deployed_on < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if deployed_on > end {
                return false;
            }
        }
        if !self.repository_ids.is_empty()
            && !self.repository_ids.contains(&deployment.repository_id)
        {
            return false;
        }
        true
    }

    fn date_matches(&self, at: DateTime<Utc>) -> bool {
        let on = at.date_naive();
        if let Some(start) = self.start_date {
            if on < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if on > end {
                return false;
            }
        }
        true
    }
}

/// Commit count contributed to one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryBreakdown {
    pub repository_id: i64,
    pub name: String,
    pub url: String,
    pub commit_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CommitStats {
    pub total_commits: u64,
    pub repository_count: u64,
    pub first_commit_at: Option<DateTime<Utc>>,
    pub last_commit_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequestStats {
    pub total: u64,
    pub merged: u64,
    pub open: u64,
}

/// One row per calendar date that has either lead-time facts or resolved
/// incidents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetric {
    pub date: NaiveDate,
    pub average_lead_time_hours: Option<f64>,
    pub deployment_count: u64,
    pub commit_count: u64,
    pub failed_deployment_count: u64,
    pub average_mttr_hours: Option<f64>,
    pub resolved_incident_count: u64,
}

/// Aggregated DORA metrics for the filtered commit set. Statistics are
/// `None`, not zero, when there is no underlying data, so "no facts yet"
/// stays distinguishable from "instantaneous lead time".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoraSummary {
    pub average_lead_time_hours: Option<f64>,
    pub min_lead_time_hours: Option<f64>,
    pub max_lead_time_hours: Option<f64>,
    pub total_deployment_count: u64,
    pub attributed_commit_count: u64,
    /// Correlation-based change failure rate, as a percentage.
    pub change_failure_rate: Option<f64>,
    pub failed_deployment_count: u64,
    pub average_mttr_hours: Option<f64>,
    pub min_mttr_hours: Option<f64>,
    pub max_mttr_hours: Option<f64>,
    pub resolved_incident_count: u64,
    pub daily: Vec<DailyMetric>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DoraReport {
    pub repositories: Vec<RepositoryBreakdown>,
    pub commits: CommitStats,
    pub pull_requests: PullRequestStats,
    pub dora: DoraSummary,
}

pub struct DashboardService<'a> {
    db: &'a DatabaseConnection,
    correlation_window_hours: i64,
}

impl<'a> DashboardService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self {
            db,
            correlation_window_hours: DEFAULT_CORRELATION_WINDOW_HOURS,
        }
    }

    pub fn with_correlation_window(mut self, hours: i64) -> Self {
        self.correlation_window_hours = hours;
        self
    }

    pub async fn report(&self, query: &MetricsQuery) -> Result<DoraReport, EngineError> {
        info!(
            authors = query.authors.len(),
            start_date = ?query.start_date,
            end_date = ?query.end_date,
            repositories = query.repository_ids.len(),
            "Building DORA report"
        );

        let edges = CommitParentRepository::new(self.db).find_all().await?;
        let parent_counts = parent_counts(&edges);

        let authored = self.authored_commits(query).await?;
        let own_commits: Vec<commit::Model> = authored
            .into_iter()
            .filter(|c| !is_merge_commit(c, &parent_counts))
            .collect();

        if own_commits.is_empty() {
            debug!("No commits matched the author set");
            return Ok(DoraReport::default());
        }

        let facts = LeadTimeRepository::new(self.db).facts_with_deployments().await?;

        let filtered_commits = self.filter_by_deployments(query, own_commits, &facts);
        if filtered_commits.is_empty() {
            debug!("No commits survived the deployment filters");
            return Ok(DoraReport::default());
        }

        let repositories = self.repository_breakdown(&filtered_commits).await?;
        let commits = commit_stats(&filtered_commits, repositories.len() as u64);
        let pull_requests = self.pull_request_stats(&filtered_commits, &edges).await?;
        let dora = self.dora_summary(query, &filtered_commits, &facts).await?;

        Ok(DoraReport {
            repositories,
            commits,
            pull_requests,
            dora,
        })
    }

    async fn authored_commits(
        &self,
        query: &MetricsQuery,
    ) -> Result<Vec<commit::Model>, EngineError> {
        let wanted: HashSet<String> = query
            .authors
            .iter()
            .map(|author| author.to_lowercase())
            .collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let all = CommitRepository::new(self.db).find_all().await?;
        Ok(all
            .into_iter()
            .filter(|c| wanted.contains(&c.author.to_lowercase()))
            .collect())
    }

    /// Keep commits whose shipping deployment passes the date/repository
    /// filters. With no filters set, every commit stays, including ones
    /// no deployment has shipped yet.
    fn filter_by_deployments(
        &self,
        query: &MetricsQuery,
        commits: Vec<commit::Model>,
        facts: &[(lead_time_fact::Model, deployment::Model)],
    ) -> Vec<commit::Model> {
        if query.is_unfiltered() {
            return commits;
        }

        let commit_shas: HashSet<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        let matching_shas: HashSet<&str> = facts
            .iter()
            .filter(|(fact, dep)| {
                commit_shas.contains(fact.commit_sha.as_str()) && query.deployment_matches(dep)
            })
            .map(|(fact, _)| fact.commit_sha.as_str())
            .collect();

        commits
            .into_iter()
            .filter(|c| matching_shas.contains(c.sha.as_str()))
            .collect()
    }

    async fn repository_breakdown(
        &self,
        commits: &[commit::Model],
    ) -> Result<Vec<RepositoryBreakdown>, EngineError> {
        let mut counts: HashMap<i64, u64> = HashMap::new();
        for commit in commits {
            *counts.entry(commit.repository_id).or_default() += 1;
        }

        let configs = RepositoryConfigRepository::new(self.db).find_all().await?;
        let mut breakdown: Vec<RepositoryBreakdown> = configs
            .into_iter()
            .filter_map(|repo| {
                counts.get(&repo.id).map(|&commit_count| RepositoryBreakdown {
                    repository_id: repo.id,
                    name: repo.name,
                    url: repo.url,
                    commit_count,
                })
            })
            .collect();

        breakdown.sort_by(|a, b| b.commit_count.cmp(&a.commit_count));
        Ok(breakdown)
    }

    /// A pull request is relevant when its first commit, or any descendant
    /// of it reached by walking child edges forwards, intersects the
    /// filtered commit set.
    async fn pull_request_stats(
        &self,
        commits: &[commit::Model],
        edges: &[crate::models::commit_parent::Model],
    ) -> Result<PullRequestStats, EngineError> {
        let commit_shas: HashSet<&str> = commits.iter().map(|c| c.sha.as_str()).collect();
        let child_index = ChildIndex::from_edges(edges);

        let all = PullRequestRepository::new(self.db).find_all().await?;
        let relevant: Vec<_> = all
            .into_iter()
            .filter(|pr| {
                let Some(first_sha) = pr.first_commit_sha.as_deref() else {
                    return false;
                };
                if commit_shas.contains(first_sha) {
                    return true;
                }
                child_index
                    .descendants(first_sha)
                    .iter()
                    .any(|sha| commit_shas.contains(sha.as_str()))
            })
            .collect();

        let merged = relevant
            .iter()
            .filter(|pr| pr.state.eq_ignore_ascii_case("closed") && pr.merged_at.is_some())
            .count() as u64;
        let open = relevant
            .iter()
            .filter(|pr| pr.state.eq_ignore_ascii_case("open"))
            .count() as u64;

        Ok(PullRequestStats {
            total: relevant.len() as u64,
            merged,
            open,
        })
    }

    async fn dora_summary(
        &self,
        query: &MetricsQuery,
        commits: &[commit::Model],
        facts: &[(lead_time_fact::Model, deployment::Model)],
    ) -> Result<DoraSummary, EngineError> {
        let commit_shas: HashSet<&str> = commits.iter().map(|c| c.sha.as_str()).collect();

        let scoped: Vec<&(lead_time_fact::Model, deployment::Model)> = facts
            .iter()
            .filter(|(fact, dep)| {
                commit_shas.contains(fact.commit_sha.as_str()) && query.deployment_matches(dep)
            })
            .collect();

        if scoped.is_empty() {
            return Ok(DoraSummary::default());
        }

        let hours: Vec<f64> = scoped
            .iter()
            .map(|(fact, _)| fact.lead_time_seconds as f64 / 3600.0)
            .collect();
        let (avg, min, max) = stats(&hours);

        let mut deployments: Vec<deployment::Model> = Vec::new();
        let mut seen = HashSet::new();
        for (_, dep) in &scoped {
            if seen.insert(dep.id) {
                deployments.push(dep.clone());
            }
        }

        let incidents = IncidentRepository::new(self.db).find_all().await?;
        let failed =
            failed_deployment_ids(&deployments, &incidents, self.correlation_window_hours);

        let total_deployment_count = deployments.len() as u64;
        let failed_deployment_count = failed.len() as u64;
        let change_failure_rate = if total_deployment_count > 0 {
            Some(failed_deployment_count as f64 * 100.0 / total_deployment_count as f64)
        } else {
            None
        };

        let resolved = resolved_incidents(query, &deployments, &incidents);
        let mttr_hours: Vec<f64> = resolved
            .iter()
            .filter_map(|incident| incident.duration_seconds)
            .map(|seconds| seconds as f64 / 3600.0)
            .collect();
        let (mttr_avg, mttr_min, mttr_max) = stats(&mttr_hours);

        let daily = daily_series(&scoped, &failed, &resolved);

        Ok(DoraSummary {
            average_lead_time_hours: avg,
            min_lead_time_hours: min,
            max_lead_time_hours: max,
            total_deployment_count,
            attributed_commit_count: scoped.len() as u64,
            change_failure_rate,
            failed_deployment_count,
            average_mttr_hours: mttr_avg,
            min_mttr_hours: mttr_min,
            max_mttr_hours: mttr_max,
            resolved_incident_count: resolved.len() as u64,
            daily,
        })
    }
}

/// Resolved incidents relevant to the filtered deployments: resolved with a
/// known duration, inside the date range, and belonging to the explicit
/// repository filter (or to the deployments' own repositories when no
/// filter was given).
fn resolved_incidents(
    query: &MetricsQuery,
    deployments: &[deployment::Model],
    incidents: &[incident::Model],
) -> Vec<incident::Model> {
    let relevant_repos: HashSet<i64> = deployments.iter().map(|d| d.repository_id).collect();

    incidents
        .iter()
        .filter(|incident| incident.state == IncidentState::Resolved)
        .filter(|incident| incident.duration_seconds.is_some())
        .filter(|incident| query.date_matches(incident.started_at.with_timezone(&Utc)))
        .filter(|incident| {
            if query.repository_ids.is_empty() {
                relevant_repos.contains(&incident.repository_id)
            } else {
                query.repository_ids.contains(&incident.repository_id)
            }
        })
        .cloned()
        .collect()
}

fn daily_series(
    scoped: &[&(lead_time_fact::Model, deployment::Model)],
    failed: &HashSet<i64>,
    resolved: &[incident::Model],
) -> Vec<DailyMetric> {
    let mut facts_by_date: BTreeMap<NaiveDate, Vec<&(lead_time_fact::Model, deployment::Model)>> =
        BTreeMap::new();
    for &entry in scoped {
        let date = entry.1.created_at.with_timezone(&Utc).date_naive();
        facts_by_date.entry(date).or_default().push(entry);
    }

    let mut incidents_by_date: BTreeMap<NaiveDate, Vec<&incident::Model>> = BTreeMap::new();
    for incident in resolved {
        let date = incident.started_at.with_timezone(&Utc).date_naive();
        incidents_by_date.entry(date).or_default().push(incident);
    }

    let mut dates: Vec<NaiveDate> = facts_by_date
        .keys()
        .chain(incidents_by_date.keys())
        .copied()
        .collect();
    dates.sort_unstable();
    dates.dedup();

    dates
        .into_iter()
        .map(|date| {
            let day_facts = facts_by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);
            let day_incidents = incidents_by_date.get(&date).map(Vec::as_slice).unwrap_or(&[]);

            let (average_lead_time_hours, deployment_count, commit_count, failed_count) =
                if day_facts.is_empty() {
                    (None, 0, 0, 0)
                } else {
                    let total_hours: f64 = day_facts
                        .iter()
                        .map(|(fact, _)| fact.lead_time_seconds as f64 / 3600.0)
                        .sum();
                    let deployment_ids: HashSet<i64> =
                        day_facts.iter().map(|(_, dep)| dep.id).collect();
                    let failed_count =
                        deployment_ids.iter().filter(|id| failed.contains(*id)).count() as u64;
                    (
                        Some(total_hours / day_facts.len() as f64),
                        deployment_ids.len() as u64,
                        day_facts.len() as u64,
                        failed_count,
                    )
                };

            let durations: Vec<f64> = day_incidents
                .iter()
                .filter_map(|incident| incident.duration_seconds)
                .map(|seconds| seconds as f64 / 3600.0)
                .collect();
            let average_mttr_hours = if durations.is_empty() {
                None
            } else {
                Some(durations.iter().sum::<f64>() / durations.len() as f64)
            };

            DailyMetric {
                date,
                average_lead_time_hours,
                deployment_count,
                commit_count,
                failed_deployment_count: failed_count,
                average_mttr_hours,
                resolved_incident_count: day_incidents.len() as u64,
            }
        })
        .collect()
}

fn commit_stats(commits: &[commit::Model], repository_count: u64) -> CommitStats {
    let timestamps: Vec<DateTime<Utc>> = commits
        .iter()
        .map(|c| c.authored_at.with_timezone(&Utc))
        .collect();

    CommitStats {
        total_commits: commits.len() as u64,
        repository_count,
        first_commit_at: timestamps.iter().min().copied(),
        last_commit_at: timestamps.iter().max().copied(),
    }
}

fn parent_counts(edges: &[crate::models::commit_parent::Model]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for edge in edges {
        *counts.entry(edge.child_sha.clone()).or_default() += 1;
    }
    counts
}

/// Merge commits are kept in the store to preserve the graph but excluded
/// from an entity's raw commit counts. Either heuristic alone suffices:
/// two or more parents, or a message starting with common merge phrasing.
fn is_merge_commit(commit: &commit::Model, parent_counts: &HashMap<String, usize>) -> bool {
    if parent_counts.get(&commit.sha).copied().unwrap_or(0) >= 2 {
        return true;
    }

    let message = commit.message.to_lowercase();
    MERGE_MESSAGE_PREFIXES
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

fn stats(values: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None, None);
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (Some(sum / values.len() as f64), Some(min), Some(max))
}
