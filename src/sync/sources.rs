//! Source trait definitions
//!
//! The interface the sync services require from the out-of-scope
//! collaborators that talk to source-control and incident-management APIs.
//! Pagination, retries and rate-limit handling all live behind these
//! traits; the engine only sees plain records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure of an upstream fetch. Distinguished from per-record persistence
/// failures: an upstream error abandons the whole unit for the pass and
/// leaves its watermark where it was.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed upstream response: {0}")]
    Malformed(String),
    #[error("network error: {0}")]
    Network(String),
}

/// One commit as reported by the source, with its parent shas.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub sha: String,
    pub author: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub parent_shas: Vec<String>,
}

/// One deployment run as reported by the source.
#[derive(Debug, Clone)]
pub struct DeploymentRecord {
    pub external_id: i64,
    pub name: Option<String>,
    pub head_branch: String,
    pub sha: String,
    pub conclusion: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One incident as reported by the source. State and severity arrive as
/// free-form strings and are normalized by the sync service.
#[derive(Debug, Clone)]
pub struct IncidentRecord {
    pub external_id: String,
    pub title: String,
    pub state: Option<String>,
    pub severity: Option<String>,
    pub started_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Commits of `owner/name` authored since `since`, oldest data welcome
    /// in any order.
    async fn commits_since(
        &self,
        owner: &str,
        name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CommitRecord>, SourceError>;
}

#[async_trait]
pub trait DeploymentSource: Send + Sync {
    /// Workflow runs of `owner/name` for `workflow` created since `since`.
    async fn runs_since(
        &self,
        owner: &str,
        name: &str,
        workflow: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<DeploymentRecord>, SourceError>;
}

#[async_trait]
pub trait IncidentSource: Send + Sync {
    /// Incidents of one service created or modified since `since`.
    async fn incidents_since(
        &self,
        service_name: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<IncidentRecord>, SourceError>;
}
