//! Mean time to recovery
//!
//! Average resolved-incident duration per calendar bucket for one service.
//! Only RESOLVED incidents count. A bucket with none reports a zero
//! average; this particular metric uses zero rather than null for "no
//! data", unlike the entity-scoped aggregate.

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::engine::periods::{Granularity, day_end, day_start, periods};
use crate::error::EngineError;
use crate::repositories::IncidentRepository;

/// MTTR for one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MttrMetric {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub resolved_incident_count: u64,
    pub average_duration_seconds: i64,
}

pub struct MttrService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> MttrService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn calculate(
        &self,
        service_name: &str,
        range_start: NaiveDate,
        range_end: NaiveDate,
        granularity: Option<Granularity>,
    ) -> Result<Vec<MttrMetric>, EngineError> {
        let incidents = IncidentRepository::new(self.db);
        let mut results = Vec::new();

        for period in periods(range_start, range_end, granularity) {
            let resolved = incidents
                .find_resolved_by_service_in_period(
                    service_name,
                    day_start(period.start),
                    day_end(period.end),
                )
                .await?;

            if resolved.is_empty() {
                results.push(MttrMetric {
                    period_start: period.start,
                    period_end: period.end,
                    resolved_incident_count: 0,
                    average_duration_seconds: 0,
                });
                continue;
            }

            let total: i64 = resolved
                .iter()
                .map(|incident| incident.duration_seconds.unwrap_or(0))
                .sum();
            let average = total / resolved.len() as i64;

            results.push(MttrMetric {
                period_start: period.start,
                period_end: period.end,
                resolved_incident_count: resolved.len() as u64,
                average_duration_seconds: average,
            });
        }

        Ok(results)
    }
}
