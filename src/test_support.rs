//! Shared fixtures for the crate's test suites: an in-memory database with
//! migrations applied, plus insert helpers for the common entities.

use chrono::{DateTime, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

use crate::models::{commit, commit_parent, deployment, repository};

pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to apply migrations");
    db
}

pub async fn insert_repository(
    db: &DatabaseConnection,
    url: &str,
    service_name: Option<&str>,
) -> repository::Model {
    let now = Utc::now();
    let name = url.rsplit('/').next().unwrap_or("repo").to_string();
    repository::ActiveModel {
        url: Set(url.to_string()),
        owner: Set("acme".to_string()),
        name: Set(name),
        service_name: Set(service_name.map(str::to_string)),
        deployment_workflow: Set(Some("deploy.yml".to_string())),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert repository")
}

pub async fn insert_commit(
    db: &DatabaseConnection,
    repo: &repository::Model,
    sha: &str,
    author: &str,
    authored_at: DateTime<Utc>,
) -> commit::Model {
    commit::ActiveModel {
        sha: Set(sha.to_string()),
        repository_id: Set(repo.id),
        author: Set(author.to_string()),
        message: Set(format!("commit {sha}")),
        authored_at: Set(authored_at.into()),
    }
    .insert(db)
    .await
    .expect("Failed to insert commit")
}

pub async fn insert_edge(
    db: &DatabaseConnection,
    repo: &repository::Model,
    child_sha: &str,
    parent_sha: &str,
) -> commit_parent::Model {
    commit_parent::ActiveModel {
        repository_id: Set(repo.id),
        child_sha: Set(child_sha.to_string()),
        parent_sha: Set(parent_sha.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert commit parent edge")
}

pub async fn insert_deployment(
    db: &DatabaseConnection,
    repo: &repository::Model,
    external_id: i64,
    sha: &str,
    created_at: DateTime<Utc>,
) -> deployment::Model {
    deployment::ActiveModel {
        external_id: Set(external_id),
        repository_id: Set(repo.id),
        name: Set(Some("deploy".to_string())),
        sha: Set(sha.to_string()),
        environment: Set(Some("production".to_string())),
        service_name: Set(repo.service_name.clone()),
        lead_time_processed: Set(false),
        created_at: Set(created_at.into()),
        updated_at: Set(created_at.into()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert deployment")
}
