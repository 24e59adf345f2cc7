//! # Deployment Repository
//!
//! Data access for deployments. The attribution engine consumes the
//! unprocessed set in creation order; the period metrics count and list
//! deployments per environment and time range.

use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::error::RepositoryError;
use crate::models::deployment::{self, Entity as Deployment, Model};

pub struct DeploymentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DeploymentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Deployments awaiting attribution for an environment, oldest first.
    /// Processing order matters: earlier deployments establish their
    /// boundary before later ones build on it.
    pub async fn find_unprocessed(
        &self,
        environment: &str,
    ) -> Result<Vec<Model>, RepositoryError> {
        Deployment::find()
            .filter(deployment::Column::LeadTimeProcessed.eq(false))
            .filter(deployment::Column::Environment.eq(environment))
            .order_by_asc(deployment::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Latest deployment of the same repository and environment created
    /// strictly before `before`; the attribution boundary anchor.
    pub async fn find_previous(
        &self,
        repository_id: i64,
        environment: &str,
        before: DateTimeWithTimeZone,
    ) -> Result<Option<Model>, RepositoryError> {
        Deployment::find()
            .filter(deployment::Column::RepositoryId.eq(repository_id))
            .filter(deployment::Column::Environment.eq(environment))
            .filter(deployment::Column::CreatedAt.lt(before))
            .order_by_desc(deployment::Column::CreatedAt)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count_in_period(
        &self,
        environment: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        Deployment::find()
            .filter(deployment::Column::Environment.eq(environment))
            .filter(deployment::Column::CreatedAt.gte(start))
            .filter(deployment::Column::CreatedAt.lte(end))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_in_period(
        &self,
        environment: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Model>, RepositoryError> {
        Deployment::find()
            .filter(deployment::Column::Environment.eq(environment))
            .filter(deployment::Column::CreatedAt.gte(start))
            .filter(deployment::Column::CreatedAt.lte(end))
            .order_by_asc(deployment::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Model>, RepositoryError> {
        Deployment::find()
            .filter(deployment::Column::ExternalId.eq(external_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Model>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Deployment::find()
            .filter(deployment::Column::Id.is_in(ids.iter().copied()))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert a freshly synced deployment. New deployments always start
    /// with `lead_time_processed = false`.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        external_id: i64,
        repository_id: i64,
        name: Option<&str>,
        sha: &str,
        environment: Option<&str>,
        service_name: Option<&str>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Model, RepositoryError> {
        let row = deployment::ActiveModel {
            external_id: Set(external_id),
            repository_id: Set(repository_id),
            name: Set(name.map(str::to_string)),
            sha: Set(sha.to_string()),
            environment: Set(environment.map(str::to_string)),
            service_name: Set(service_name.map(str::to_string)),
            lead_time_processed: Set(false),
            created_at: Set(created_at.into()),
            updated_at: Set(updated_at.into()),
            ..Default::default()
        };
        row.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
