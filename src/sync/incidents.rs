//! Incident synchronization
//!
//! Mirrors incidents per configured service, keyed by external id and
//! updated in place as they evolve. Each service is an independent unit:
//! an upstream failure abandons only that service's window for the pass.

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::DatabaseConnection;
use tracing::{debug, error, info, instrument, warn};

use crate::error::EngineError;
use crate::models::incident::{IncidentSeverity, IncidentState};
use crate::repositories::incident::IncidentUpsert;
use crate::repositories::{IncidentRepository, RepositoryConfigRepository, WatermarkStore};
use crate::sync::sources::{IncidentRecord, IncidentSource};

/// Counters from one incident sync pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IncidentSyncStats {
    pub incidents_created: usize,
    pub incidents_updated: usize,
    pub records_failed: usize,
}

pub struct IncidentSync<'a> {
    db: &'a DatabaseConnection,
    source: &'a dyn IncidentSource,
    lookback_days: u32,
}

impl<'a> IncidentSync<'a> {
    pub fn new(
        db: &'a DatabaseConnection,
        source: &'a dyn IncidentSource,
        lookback_days: u32,
    ) -> Self {
        Self {
            db,
            source,
            lookback_days,
        }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<IncidentSyncStats, EngineError> {
        let configs = RepositoryConfigRepository::new(self.db).find_all().await?;
        if configs.is_empty() {
            warn!("No repositories configured for incident synchronization");
            return Ok(IncidentSyncStats::default());
        }

        let watermarks = WatermarkStore::new(self.db);
        let incidents = IncidentRepository::new(self.db);
        let mut stats = IncidentSyncStats::default();

        for config in configs {
            let Some(service_name) = config.service_name.as_deref() else {
                debug!(url = %config.url, "No service name configured; skipping incident sync");
                continue;
            };

            let job = format!("incident_sync:{service_name}");
            let since = watermarks.since(&job, self.lookback_days).await?;

            let records = match self.source.incidents_since(service_name, since).await {
                Ok(records) => records,
                Err(err) => {
                    error!(service = %service_name, error = %err, "Incident fetch failed");
                    counter!("incident_sync_upstream_failures_total").increment(1);
                    continue;
                }
            };

            debug!(service = %service_name, records = records.len(), "Fetched incident records");

            for record in records {
                let upsert = map_record(record, config.id, service_name);
                match incidents.upsert(upsert).await {
                    Ok(true) => stats.incidents_created += 1,
                    Ok(false) => stats.incidents_updated += 1,
                    Err(err) => {
                        error!(service = %service_name, error = %err, "Failed to persist incident");
                        stats.records_failed += 1;
                    }
                }
            }

            if let Err(err) = watermarks.advance(&job, Utc::now()).await {
                error!(job = %job, error = %err, "Failed to advance watermark");
            }
        }

        counter!("incident_sync_created_total").increment(stats.incidents_created as u64);
        counter!("incident_sync_updated_total").increment(stats.incidents_updated as u64);

        info!(
            created = stats.incidents_created,
            updated = stats.incidents_updated,
            failed = stats.records_failed,
            "Incident sync pass completed"
        );

        Ok(stats)
    }
}

fn map_record(record: IncidentRecord, repository_id: i64, service_name: &str) -> IncidentUpsert {
    let duration_seconds = record
        .resolved_at
        .map(|resolved: DateTime<Utc>| (resolved - record.started_at).num_seconds());

    IncidentUpsert {
        external_id: record.external_id,
        repository_id,
        title: record.title,
        state: map_state(record.state.as_deref()),
        severity: map_severity(record.severity.as_deref()),
        started_at: record.started_at,
        resolved_at: record.resolved_at,
        duration_seconds,
        service_name: Some(service_name.to_string()),
    }
}

fn map_state(state: Option<&str>) -> IncidentState {
    match state.map(str::to_lowercase).as_deref() {
        Some("resolved") => IncidentState::Resolved,
        Some("stable") => IncidentState::Stable,
        _ => IncidentState::Active,
    }
}

/// Sources report severities like "SEV-1"; normalize dashes and case,
/// defaulting anything unknown to the lowest severity.
fn map_severity(severity: Option<&str>) -> IncidentSeverity {
    let normalized = severity
        .map(|s| s.to_uppercase().replace('-', ""))
        .unwrap_or_default();

    match normalized.as_str() {
        "SEV1" => IncidentSeverity::Sev1,
        "SEV2" => IncidentSeverity::Sev2,
        "SEV3" => IncidentSeverity::Sev3,
        "SEV4" => IncidentSeverity::Sev4,
        _ => IncidentSeverity::Sev5,
    }
}
