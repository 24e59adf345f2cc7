//! # Watermarked Ingestion
//!
//! Sync services that mirror commits, deployments and incidents from
//! out-of-scope collaborators into the store. The collaborators appear
//! only as source traits; each service bounds its fetch with a per-job
//! watermark and contains per-record failures so one bad row never stalls
//! a pass.

pub mod commits;
pub mod deployments;
pub mod incidents;
pub mod sources;

pub use commits::CommitSync;
pub use deployments::DeploymentSync;
pub use incidents::IncidentSync;
pub use sources::{
    CommitRecord, CommitSource, DeploymentRecord, DeploymentSource, IncidentRecord,
    IncidentSource, SourceError,
};

use url::Url;

/// Parse a repository URL into its (owner, name) pair, tolerating a
/// trailing `.git` suffix. Returns `None` for anything that does not have
/// both path segments; callers skip such repositories for the pass.
pub fn parse_owner_name(repository_url: &str) -> Option<(String, String)> {
    let url = Url::parse(repository_url).ok()?;
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());

    let owner = segments.next()?.to_string();
    let name = segments.next()?.trim_end_matches(".git").to_string();
    if owner.is_empty() || name.is_empty() || segments.next().is_some() {
        return None;
    }

    Some((owner, name))
}
