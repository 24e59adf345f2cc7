//! Deployment/incident correlation
//!
//! Flags a deployment as failed when an incident starts within the
//! correlation window after it and the identity match succeeds: service
//! name when both sides carry one, repository otherwise. Correlation is a
//! deliberate approximation; pinpointing the causal deployment for an
//! incident is not attempted.

use std::collections::HashSet;

use chrono::Duration;

use crate::models::{deployment, incident};

/// Width of the correlation window after a deployment.
pub const DEFAULT_CORRELATION_WINDOW_HOURS: i64 = 48;

/// Ids of deployments with at least one correlated incident. The window is
/// inclusive at the deployment time and exclusive at its end.
pub fn failed_deployment_ids(
    deployments: &[deployment::Model],
    incidents: &[incident::Model],
    window_hours: i64,
) -> HashSet<i64> {
    deployments
        .iter()
        .filter(|deployment| {
            incidents
                .iter()
                .any(|incident| is_correlated(deployment, incident, window_hours))
        })
        .map(|deployment| deployment.id)
        .collect()
}

fn is_correlated(
    deployment: &deployment::Model,
    incident: &incident::Model,
    window_hours: i64,
) -> bool {
    let window_start = deployment.created_at;
    let window_end = window_start + Duration::hours(window_hours);

    let within_window =
        incident.started_at >= window_start && incident.started_at < window_end;
    if !within_window {
        return false;
    }

    match (&deployment.service_name, &incident.service_name) {
        (Some(deployment_service), Some(incident_service)) => {
            deployment_service == incident_service
        }
        _ => deployment.repository_id == incident.repository_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::incident::{IncidentSeverity, IncidentState};
    use chrono::{DateTime, Utc};

    fn deployment_at(
        id: i64,
        repository_id: i64,
        service_name: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> deployment::Model {
        deployment::Model {
            id,
            external_id: id,
            repository_id,
            name: None,
            sha: format!("sha-{id}"),
            environment: Some("production".to_string()),
            service_name: service_name.map(str::to_string),
            lead_time_processed: true,
            created_at: created_at.into(),
            updated_at: created_at.into(),
        }
    }

    fn incident_at(
        id: i64,
        repository_id: i64,
        service_name: Option<&str>,
        started_at: DateTime<Utc>,
    ) -> incident::Model {
        incident::Model {
            id,
            external_id: format!("INC-{id}"),
            repository_id,
            title: "degraded service".to_string(),
            state: IncidentState::Active,
            severity: IncidentSeverity::Sev2,
            started_at: started_at.into(),
            resolved_at: None,
            duration_seconds: None,
            service_name: service_name.map(str::to_string),
            created_at: started_at.into(),
            updated_at: started_at.into(),
        }
    }

    #[test]
    fn incident_at_deployment_time_is_inside_the_window() {
        let t = Utc::now();
        let deployments = [deployment_at(1, 1, Some("checkout"), t)];
        let incidents = [incident_at(1, 1, Some("checkout"), t)];

        let failed = failed_deployment_ids(&deployments, &incidents, 48);
        assert!(failed.contains(&1));
    }

    #[test]
    fn incident_at_window_end_is_outside() {
        let t = Utc::now();
        let deployments = [deployment_at(1, 1, Some("checkout"), t)];
        let incidents = [incident_at(1, 1, Some("checkout"), t + Duration::hours(48))];

        let failed = failed_deployment_ids(&deployments, &incidents, 48);
        assert!(failed.is_empty());
    }

    #[test]
    fn incident_before_deployment_does_not_correlate() {
        let t = Utc::now();
        let deployments = [deployment_at(1, 1, Some("checkout"), t)];
        let incidents = [incident_at(1, 1, Some("checkout"), t - Duration::seconds(1))];

        assert!(failed_deployment_ids(&deployments, &incidents, 48).is_empty());
    }

    #[test]
    fn service_names_must_match_when_both_present() {
        let t = Utc::now();
        let deployments = [deployment_at(1, 1, Some("checkout"), t)];
        let incidents = [incident_at(1, 1, Some("payments"), t + Duration::hours(1))];

        // Same repository, but the service identities disagree.
        assert!(failed_deployment_ids(&deployments, &incidents, 48).is_empty());
    }

    #[test]
    fn repository_fallback_applies_when_a_service_name_is_missing() {
        let t = Utc::now();
        let deployments = [
            deployment_at(1, 1, None, t),
            deployment_at(2, 2, None, t),
        ];
        let incidents = [incident_at(1, 1, Some("checkout"), t + Duration::hours(1))];

        let failed = failed_deployment_ids(&deployments, &incidents, 48);
        assert!(failed.contains(&1));
        assert!(!failed.contains(&2));
    }

    #[test]
    fn one_incident_can_flag_multiple_deployments() {
        // Attribution of a single causal deployment is out of scope; every
        // deployment whose window covers the incident is flagged.
        let t = Utc::now();
        let deployments = [
            deployment_at(1, 1, Some("checkout"), t),
            deployment_at(2, 1, Some("checkout"), t + Duration::hours(12)),
        ];
        let incidents = [incident_at(1, 1, Some("checkout"), t + Duration::hours(24))];

        let failed = failed_deployment_ids(&deployments, &incidents, 48);
        assert_eq!(failed.len(), 2);
    }
}
