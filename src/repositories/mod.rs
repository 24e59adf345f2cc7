//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing the query contracts the
//! metrics engine and its reporting consumers rely on.

pub mod commit;
pub mod deployment;
pub mod incident;
pub mod lead_time;
pub mod pull_request;
pub mod repository_config;
pub mod watermark;

pub use commit::{CommitParentRepository, CommitRepository};
pub use deployment::DeploymentRepository;
pub use incident::IncidentRepository;
pub use lead_time::LeadTimeRepository;
pub use pull_request::PullRequestRepository;
pub use repository_config::RepositoryConfigRepository;
pub use watermark::WatermarkStore;
