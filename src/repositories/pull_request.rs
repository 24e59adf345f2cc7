//! # Pull Request Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::error::RepositoryError;
use crate::models::pull_request::{self, Entity as PullRequest, Model};

/// Fields of a pull request as reported by the source.
#[derive(Debug, Clone)]
pub struct PullRequestUpsert {
    pub external_id: i64,
    pub repository_id: i64,
    pub number: i32,
    pub title: String,
    pub author: String,
    pub state: String,
    pub merged_at: Option<DateTime<Utc>>,
    pub first_commit_sha: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct PullRequestRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PullRequestRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_all(&self) -> Result<Vec<Model>, RepositoryError> {
        PullRequest::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_external_id(
        &self,
        external_id: i64,
    ) -> Result<Option<Model>, RepositoryError> {
        PullRequest::find()
            .filter(pull_request::Column::ExternalId.eq(external_id))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert the pull request if unseen, otherwise update its state and
    /// merge timestamp in place.
    pub async fn upsert(&self, record: PullRequestUpsert) -> Result<bool, RepositoryError> {
        match self.find_by_external_id(record.external_id).await? {
            Some(existing) => {
                let mut active: pull_request::ActiveModel = existing.into();
                active.state = Set(record.state);
                active.merged_at = Set(record.merged_at.map(Into::into));
                active.first_commit_sha = Set(record.first_commit_sha);
                active.updated_at = Set(record.updated_at.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
                Ok(false)
            }
            None => {
                let row = pull_request::ActiveModel {
                    external_id: Set(record.external_id),
                    repository_id: Set(record.repository_id),
                    number: Set(record.number),
                    title: Set(record.title),
                    author: Set(record.author),
                    state: Set(record.state),
                    merged_at: Set(record.merged_at.map(Into::into)),
                    first_commit_sha: Set(record.first_commit_sha),
                    created_at: Set(record.created_at.into()),
                    updated_at: Set(record.updated_at.into()),
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
