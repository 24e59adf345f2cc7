//! Change failure rate (portfolio form)
//!
//! Per-bucket ratio of incidents to deployments for one service and
//! environment. Correlating an individual incident with the exact
//! deployment that caused it is not practical in general, so this metric
//! deliberately uses the plain period ratio; the correlation-based
//! per-deployment flagging lives in [`crate::engine::correlation`] and
//! serves the entity-scoped aggregate instead.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::engine::periods::{Granularity, day_end, day_start, periods};
use crate::error::EngineError;
use crate::repositories::{DeploymentRepository, IncidentRepository};

/// Informational DORA performance band, derived from the CFR percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DoraLevel {
    Elite,
    High,
    Medium,
    Low,
}

impl DoraLevel {
    /// Band a CFR percentage. Boundaries are inclusive on the upper bound
    /// of each band.
    pub fn from_cfr_percentage(percentage: f64) -> Self {
        if percentage <= 15.0 {
            DoraLevel::Elite
        } else if percentage <= 30.0 {
            DoraLevel::High
        } else if percentage <= 45.0 {
            DoraLevel::Medium
        } else {
            DoraLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DoraLevel::Elite => "Elite",
            DoraLevel::High => "High",
            DoraLevel::Medium => "Medium",
            DoraLevel::Low => "Low",
        }
    }
}

/// CFR for one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CfrMetric {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub deployment_count: u64,
    pub incident_count: u64,
    /// incidents / deployments; 0.0 when there were no deployments.
    pub rate: f64,
}

impl CfrMetric {
    pub fn level(&self) -> DoraLevel {
        DoraLevel::from_cfr_percentage(self.rate * 100.0)
    }
}

pub struct CfrService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CfrService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn calculate(
        &self,
        service_name: &str,
        environment: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
        granularity: Option<Granularity>,
    ) -> Result<Vec<CfrMetric>, EngineError> {
        let deployments = DeploymentRepository::new(self.db);
        let incidents = IncidentRepository::new(self.db);
        let mut results = Vec::new();

        for period in periods(range_start, range_end, granularity) {
            let start = day_start(period.start);
            let end = day_end(period.end);

            let deployment_count = deployments
                .count_in_period(environment, start, end)
                .await?;
            let incident_count = incidents
                .count_by_service_in_period(service_name, start, end)
                .await?;

            // Never divide by zero: a bucket without deployments reports a
            // rate of 0, not "undefined".
            let rate = if deployment_count > 0 {
                incident_count as f64 / deployment_count as f64
            } else {
                0.0
            };

            results.push(CfrMetric {
                period_start: period.start,
                period_end: period.end,
                deployment_count,
                incident_count,
                rate,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::incident::{IncidentSeverity, IncidentState};
    use crate::repositories::incident::IncidentUpsert;
    use crate::test_support::{insert_deployment, insert_repository, test_db};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn insert_incident(
        db: &sea_orm::DatabaseConnection,
        repo_id: i64,
        external_id: &str,
        started_at: DateTime<Utc>,
    ) {
        IncidentRepository::new(db)
            .upsert(IncidentUpsert {
                external_id: external_id.to_string(),
                repository_id: repo_id,
                title: "degraded".to_string(),
                state: IncidentState::Active,
                severity: IncidentSeverity::Sev3,
                started_at,
                resolved_at: None,
                duration_seconds: None,
                service_name: Some("checkout".to_string()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn zero_deployments_reports_zero_rate_not_undefined() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", Some("checkout")).await;
        let t = Utc.with_ymd_and_hms(2025, 11, 4, 10, 0, 0).unwrap();

        for i in 0..3 {
            insert_incident(&db, repo.id, &format!("INC-{i}"), t + chrono::Duration::hours(i)).await;
        }

        let results = CfrService::new(&db)
            .calculate(
                "checkout",
                "production",
                date(2025, 11, 3),
                date(2025, 11, 9),
                Some(Granularity::Weekly),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].deployment_count, 0);
        assert_eq!(results[0].incident_count, 3);
        assert_eq!(results[0].rate, 0.0);
        assert_eq!(results[0].level(), DoraLevel::Elite);
    }

    #[tokio::test]
    async fn rate_can_exceed_one_when_incidents_outnumber_deployments() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", Some("checkout")).await;
        let t = Utc.with_ymd_and_hms(2025, 11, 4, 10, 0, 0).unwrap();

        for i in 0..5 {
            insert_deployment(&db, &repo, i, &format!("sha{i}"), t + chrono::Duration::minutes(i)).await;
        }
        for i in 0..8 {
            insert_incident(&db, repo.id, &format!("INC-{i}"), t + chrono::Duration::hours(i)).await;
        }

        let results = CfrService::new(&db)
            .calculate(
                "checkout",
                "production",
                date(2025, 11, 3),
                date(2025, 11, 9),
                Some(Granularity::Weekly),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].rate - 1.6).abs() < f64::EPSILON);
        assert_eq!(results[0].level(), DoraLevel::Low);
    }

    #[test]
    fn banding_boundaries_are_inclusive() {
        assert_eq!(DoraLevel::from_cfr_percentage(0.0), DoraLevel::Elite);
        assert_eq!(DoraLevel::from_cfr_percentage(15.0), DoraLevel::Elite);
        assert_eq!(DoraLevel::from_cfr_percentage(15.1), DoraLevel::High);
        assert_eq!(DoraLevel::from_cfr_percentage(30.0), DoraLevel::High);
        assert_eq!(DoraLevel::from_cfr_percentage(45.0), DoraLevel::Medium);
        assert_eq!(DoraLevel::from_cfr_percentage(45.1), DoraLevel::Low);
        assert_eq!(DoraLevel::from_cfr_percentage(160.0), DoraLevel::Low);
    }
}
