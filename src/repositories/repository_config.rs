//! # Repository Config Repository
//!
//! Data access for the configured source repositories the sync services
//! iterate over.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::error::RepositoryError;
use crate::models::repository::{self, Entity as Repository, Model};

pub struct RepositoryConfigRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RepositoryConfigRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All configured repositories, in insertion order.
    pub async fn find_all(&self) -> Result<Vec<Model>, RepositoryError> {
        Repository::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Model>, RepositoryError> {
        Repository::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<Model>, RepositoryError> {
        Repository::find()
            .filter(repository::Column::Url.eq(url))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Register a repository configuration.
    pub async fn insert(
        &self,
        url: &str,
        owner: &str,
        name: &str,
        service_name: Option<&str>,
        deployment_workflow: Option<&str>,
    ) -> Result<Model, RepositoryError> {
        let now = Utc::now();
        let row = repository::ActiveModel {
            url: Set(url.to_string()),
            owner: Set(owner.to_string()),
            name: Set(name.to_string()),
            service_name: Set(service_name.map(str::to_string)),
            deployment_workflow: Set(deployment_workflow.map(str::to_string)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        row.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
