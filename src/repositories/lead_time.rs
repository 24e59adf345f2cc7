//! # Lead Time Fact Repository
//!
//! Data access for derived lead-time facts. Facts are written by the
//! attribution engine and read by the dashboard aggregator, always joined
//! with the deployment that produced them.

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};

use crate::error::RepositoryError;
use crate::models::deployment;
use crate::models::lead_time_fact::{self, Entity as LeadTimeFact, Model};

pub struct LeadTimeRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> LeadTimeRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All facts with their deployments, for in-memory filtering by commit
    /// set, date range and repository set.
    pub async fn facts_with_deployments(
        &self,
    ) -> Result<Vec<(Model, deployment::Model)>, RepositoryError> {
        let rows = LeadTimeFact::find()
            .find_also_related(deployment::Entity)
            .order_by_asc(lead_time_fact::Column::Id)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        // The deployment FK is not nullable; a missing join row would mean
        // a torn write, which the per-deployment transaction rules out.
        Ok(rows
            .into_iter()
            .filter_map(|(fact, dep)| dep.map(|d| (fact, d)))
            .collect())
    }

    pub async fn find_by_deployment(
        &self,
        deployment_id: i64,
    ) -> Result<Vec<Model>, RepositoryError> {
        LeadTimeFact::find()
            .filter(lead_time_fact::Column::DeploymentId.eq(deployment_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn count(&self) -> Result<u64, RepositoryError> {
        LeadTimeFact::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
