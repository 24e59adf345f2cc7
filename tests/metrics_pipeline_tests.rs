//! End-to-end pipeline tests: mirror data through the sync services with
//! fake sources, attribute deployments, and read the aggregates back the
//! way a reporting consumer would.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use dorametrics::engine::{
    CfrService, DashboardService, DeploymentFrequencyService, Granularity, MetricsQuery,
};
use dorametrics::migration::{Migrator, MigratorTrait};
use dorametrics::models::repository;
use dorametrics::repositories::LeadTimeRepository;
use dorametrics::sync::{
    CommitRecord, CommitSource, CommitSync, DeploymentRecord, DeploymentSource, DeploymentSync,
    IncidentRecord, IncidentSource, IncidentSync, SourceError,
};

async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

async fn configure_repository(db: &DatabaseConnection) -> repository::Model {
    let now = Utc::now();
    repository::ActiveModel {
        url: Set("https://github.com/acme/api".to_string()),
        owner: Set("acme".to_string()),
        name: Set("api".to_string()),
        service_name: Set(Some("checkout".to_string())),
        deployment_workflow: Set(Some("deploy.yml".to_string())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to configure repository")
}

struct FakeSources {
    commits: Vec<CommitRecord>,
    runs: Vec<DeploymentRecord>,
    incidents: Vec<IncidentRecord>,
}

#[async_trait]
impl CommitSource for FakeSources {
    async fn commits_since(
        &self,
        _owner: &str,
        _name: &str,
        _since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>, SourceError> {
        Ok(self.commits.clone())
    }
}

#[async_trait]
impl DeploymentSource for FakeSources {
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

#[async_trait]
impl IncidentSource for FakeSources {
    async fn incidents_since(
        &self,
        _service_name: &str,
        _since: DateTime<Utc>,
    ) -> Result<Vec<IncidentRecord>, SourceError> {
        Ok(self.incidents.clone())
    }
}

fn commit(sha: &str, author: &str, authored_at: DateTime<Utc>, parents: &[&str]) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        author: author.to_string(),
        message: format!("change {sha}"),
        authored_at,
        parent_shas: parents.iter().map(|s| s.to_string()).collect(),
    }
}

fn successful_run(external_id: i64, sha: &str, created_at: DateTime<Utc>) -> DeploymentRecord {
    DeploymentRecord {
        external_id,
        name: Some("deploy".to_string()),
        head_branch: "main".to_string(),
        sha: sha.to_string(),
        conclusion: Some("success".to_string()),
        created_at,
        updated_at: created_at,
    }
}

#[tokio::test]
async fn mirrored_history_flows_into_dora_aggregates() {
    let db = setup_db().await;
    configure_repository(&db).await;

    let day1 = Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap();
    let day4 = day1 + Duration::days(3);

    let incident_start = day4 + Duration::hours(2);
    let sources = FakeSources {
        commits: vec![
            commit("c1", "alice", day1, &[]),
            commit("c2", "alice", day1 + Duration::hours(2), &["c1"]),
            commit("c3", "bob", day1 + Duration::hours(4), &["c2"]),
        ],
        runs: vec![
            successful_run(1, "c1", day1 + Duration::hours(1)),
            successful_run(2, "c3", day4),
        ],
        incidents: vec![IncidentRecord {
            external_id: "INC-1".to_string(),
            title: "checkout errors".to_string(),
            state: Some("resolved".to_string()),
            severity: Some("SEV-2".to_string()),
            started_at: incident_start,
            resolved_at: Some(incident_start + Duration::hours(1)),
        }],
    };

    CommitSync::new(&db, &sources, 365).run().await.unwrap();
    let deployment_stats = DeploymentSync::new(&db, &sources, 365, "production")
        .run()
        .await
        .unwrap();
    IncidentSync::new(&db, &sources, 365).run().await.unwrap();

    assert_eq!(deployment_stats.deployments_created, 2);
    // Deployment 1 ships {c1}, deployment 2 ships {c2, c3}.
    assert_eq!(deployment_stats.facts_created, 3);
    assert_eq!(LeadTimeRepository::new(&db).count().await.unwrap(), 3);

    // Re-running the whole pipeline is a no-op: watermarks bound the
    // fetches and the processed flag bounds attribution.
    let rerun = DeploymentSync::new(&db, &sources, 365, "production")
        .run()
        .await
        .unwrap();
    assert_eq!(rerun.deployments_created, 0);
    assert_eq!(rerun.facts_created, 0);
    assert_eq!(LeadTimeRepository::new(&db).count().await.unwrap(), 3);

    // alice's view: commits c1 and c2, two deployments, one of them
    // correlated to the incident.
    let report = DashboardService::new(&db)
        .report(&MetricsQuery::for_author("alice"))
        .await
        .unwrap();
    assert_eq!(report.commits.total_commits, 2);
    assert_eq!(report.dora.total_deployment_count, 2);
    assert_eq!(report.dora.failed_deployment_count, 1);
    assert_eq!(report.dora.change_failure_rate, Some(50.0));
    assert_eq!(report.dora.resolved_incident_count, 1);
    assert_eq!(report.pull_requests.total, 0);

    // Portfolio views over the same week-and-a-bit.
    let range_start = day1.date_naive();
    let range_end = day4.date_naive();

    let frequency = DeploymentFrequencyService::new(&db)
        .calculate("production", range_start, range_end, Some(Granularity::Weekly))
        .await
        .unwrap();
    assert_eq!(frequency.len(), 1);
    assert_eq!(frequency[0].deployment_count, 2);

    let cfr = CfrService::new(&db)
        .calculate(
            "checkout",
            "production",
            range_start,
            range_end,
            Some(Granularity::Weekly),
        )
        .await
        .unwrap();
    assert_eq!(cfr.len(), 1);
    assert_eq!(cfr[0].deployment_count, 2);
    assert_eq!(cfr[0].incident_count, 1);
    assert!((cfr[0].rate - 0.5).abs() < f64::EPSILON);
}
