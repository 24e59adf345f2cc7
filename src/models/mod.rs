//! # Data Models
//!
//! SeaORM entities for the metrics store: the mirrored commit graph,
//! deployments, incidents, derived lead-time facts, and sync watermarks.

pub mod commit;
pub mod commit_parent;
pub mod deployment;
pub mod incident;
pub mod lead_time_fact;
pub mod pull_request;
pub mod repository;
pub mod sync_watermark;

pub use commit::Entity as Commit;
pub use commit_parent::Entity as CommitParent;
pub use deployment::Entity as Deployment;
pub use incident::Entity as Incident;
pub use lead_time_fact::Entity as LeadTimeFact;
pub use pull_request::Entity as PullRequest;
pub use repository::Entity as Repository;
pub use sync_watermark::Entity as SyncWatermark;
