//! Deployment frequency
//!
//! Deployments per calendar bucket for one environment.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::engine::periods::{Granularity, day_end, day_start, periods};
use crate::error::EngineError;
use crate::repositories::DeploymentRepository;

/// Deployment count for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentFrequency {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub deployment_count: u64,
}

pub struct DeploymentFrequencyService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DeploymentFrequencyService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn calculate(
        &self,
        environment: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
        granularity: Option<Granularity>,
    ) -> Result<Vec<DeploymentFrequency>, EngineError> {
        let deployments = DeploymentRepository::new(self.db);
        let mut results = Vec::new();

        for period in periods(range_start, range_end, granularity) {
            let deployment_count = deployments
                .count_in_period(environment, day_start(period.start), day_end(period.end))
                .await?;

            results.push(DeploymentFrequency {
                period_start: period.start,
                period_end: period.end,
                deployment_count,
            });
        }

        Ok(results)
    }
}
