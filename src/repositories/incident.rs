//! # Incident Repository
//!
//! Data access for incidents. Rows are keyed by their external id and
//! updated in place as the incident evolves at the source.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::RepositoryError;
use crate::models::incident::{self, Entity as Incident, IncidentSeverity, IncidentState, Model};

/// Fields of an incident as reported by the source, used for both insert
/// and in-place update.
#[derive(Debug, Clone)]
pub struct IncidentUpsert {
    pub external_id: String,
    pub repository_id: i64,
    pub title: String,
    pub state: IncidentState,
    pub severity: IncidentSeverity,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub service_name: Option<String>,
}

pub struct IncidentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> IncidentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Model>, RepositoryError> {
        Incident::find()
            .filter(incident::Column::ExternalId.eq(external_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_all(&self) -> Result<Vec<Model>, RepositoryError> {
        Incident::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count_by_service_in_period(
        &self,
        service_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Incident::find()
            .filter(incident::Column::ServiceName.eq(service_name))
            .filter(incident::Column::StartedAt.gte(start))
            .filter(incident::Column::StartedAt.lte(end))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_resolved_by_service_in_period(
        &self,
        service_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Model>, RepositoryError> {
        Incident::find()
            .filter(incident::Column::ServiceName.eq(service_name))
            .filter(incident::Column::State.eq(IncidentState::Resolved))
            .filter(incident::Column::StartedAt.gte(start))
            .filter(incident::Column::StartedAt.lte(end))
            .order_by_asc(incident::Column::StartedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert the incident if unseen, otherwise update state, resolution
    /// and severity in place. Returns true when a new row was created.
    pub async fn upsert(&self, record: IncidentUpsert) -> Result<bool, RepositoryError> {
        let now = Utc::now();
        match self.find_by_external_id(&record.external_id).await? {
            Some(existing) => {
                let mut active: incident::ActiveModel = existing.into();
                active.state = Set(record.state);
                active.severity = Set(record.severity);
                active.resolved_at = Set(record.resolved_at.map(Into::into));
                active.duration_seconds = Set(record.duration_seconds);
                active.updated_at = Set(now.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
                Ok(false)
            }
            None => {
                let row = incident::ActiveModel {
                    external_id: Set(record.external_id),
                    repository_id: Set(record.repository_id),
                    title: Set(record.title),
                    state: Set(record.state),
                    severity: Set(record.severity),
                    started_at: Set(record.started_at.into()),
                    resolved_at: Set(record.resolved_at.map(Into::into)),
                    duration_seconds: Set(record.duration_seconds),
                    service_name: Set(record.service_name),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                    ..Default::default()
                };
                row.insert(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_repository, test_db};
    use chrono::Duration;

    fn upsert_record(repo_id: i64, external_id: &str, started_at: DateTime<Utc>) -> IncidentUpsert {
        IncidentUpsert {
            external_id: external_id.to_string(),
            repository_id: repo_id,
            title: "checkout latency".to_string(),
            state: IncidentState::Active,
            severity: IncidentSeverity::Sev2,
            started_at,
            resolved_at: None,
            duration_seconds: None,
            service_name: Some("checkout".to_string()),
        }
    }

    #[tokio::test]
    async fn upsert_creates_then_updates_in_place() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", Some("checkout")).await;
        let incidents = IncidentRepository::new(&db);
        let started = Utc::now();

        let created = incidents
            .upsert(upsert_record(repo.id, "INC-1", started))
            .await
            .unwrap();
        assert!(created);

        // The incident resolves at the source; the same external id must
        // update the existing row, not create a second one.
        let mut resolved = upsert_record(repo.id, "INC-1", started);
        resolved.state = IncidentState::Resolved;
        resolved.resolved_at = Some(started + Duration::hours(2));
        resolved.duration_seconds = Some(7200);

        let created = incidents.upsert(resolved).await.unwrap();
        assert!(!created);

        let all = incidents.find_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].state, IncidentState::Resolved);
        assert_eq!(all[0].duration_seconds, Some(7200));
    }

    #[tokio::test]
    async fn resolved_query_filters_state_and_window() {
        let db = test_db().await;
        let repo = insert_repository(&db, "https://github.com/acme/api", Some("checkout")).await;
        let incidents = IncidentRepository::new(&db);
        let base = Utc::now();

        let mut resolved = upsert_record(repo.id, "INC-1", base);
        resolved.state = IncidentState::Resolved;
        resolved.duration_seconds = Some(600);
        incidents.upsert(resolved).await.unwrap();

        // Still active: excluded from the resolved query.
        incidents
            .upsert(upsert_record(repo.id, "INC-2", base + Duration::hours(1)))
            .await
            .unwrap();

        // Resolved but outside the window.
        let mut outside = upsert_record(repo.id, "INC-3", base + Duration::days(20));
        outside.state = IncidentState::Resolved;
        outside.duration_seconds = Some(300);
        incidents.upsert(outside).await.unwrap();

        let found = incidents
            .find_resolved_by_service_in_period("checkout", base, base + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].external_id, "INC-1");

        let count = incidents
            .count_by_service_in_period("checkout", base, base + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
