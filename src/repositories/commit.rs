//! # Commit & Parent-Edge Repositories
//!
//! Data access for the mirrored commit graph. Commits and their parent
//! edges are append-only: the sync services insert rows they have not seen,
//! and nothing ever mutates them afterwards.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};

use crate::error::RepositoryError;
use crate::models::commit::{self, Entity as Commit};
use crate::models::commit_parent::{self, Entity as CommitParent};

/// Repository for commit rows.
pub struct CommitRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CommitRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn exists(&self, sha: &str) -> Result<bool, RepositoryError> {
        let count = Commit::find_by_id(sha)
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    pub async fn find_by_sha(&self, sha: &str) -> Result<Option<commit::Model>, RepositoryError> {
        Commit::find_by_id(sha)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// All commits of one repository; the attribution engine loads these
    /// once per pass to walk the graph in memory.
    pub async fn find_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<commit::Model>, RepositoryError> {
        Commit::find()
            .filter(commit::Column::RepositoryId.eq(repository_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_all(&self) -> Result<Vec<commit::Model>, RepositoryError> {
        Commit::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert a commit; the caller has already checked it is unseen.
    pub async fn insert(
        &self,
        repository_id: i64,
        sha: &str,
        author: &str,
        message: &str,
        authored_at: DateTime<Utc>,
    ) -> Result<commit::Model, RepositoryError> {
        let row = commit::ActiveModel {
            sha: Set(sha.to_string()),
            repository_id: Set(repository_id),
            author: Set(author.to_string()),
            message: Set(message.to_string()),
            authored_at: Set(authored_at.into()),
        };
        row.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

/// Repository for parent edges of the commit graph.
pub struct CommitParentRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CommitParentRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_repository(
        &self,
        repository_id: i64,
    ) -> Result<Vec<commit_parent::Model>, RepositoryError> {
        CommitParent::find()
            .filter(commit_parent::Column::RepositoryId.eq(repository_id))
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_all(&self) -> Result<Vec<commit_parent::Model>, RepositoryError> {
        CommitParent::find()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn exists(&self, child_sha: &str, parent_sha: &str) -> Result<bool, RepositoryError> {
        let count = CommitParent::find()
            .filter(commit_parent::Column::ChildSha.eq(child_sha))
            .filter(commit_parent::Column::ParentSha.eq(parent_sha))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    pub async fn insert(
        &self,
        repository_id: i64,
        child_sha: &str,
        parent_sha: &str,
    ) -> Result<commit_parent::Model, RepositoryError> {
        let row = commit_parent::ActiveModel {
            repository_id: Set(repository_id),
            child_sha: Set(child_sha.to_string()),
            parent_sha: Set(parent_sha.to_string()),
            ..Default::default()
        };
        row.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
