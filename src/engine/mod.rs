//! # Metrics Engine
//!
//! The deployment correlation and metrics aggregation core: commit-graph
//! attribution, incident correlation, calendar bucketing, and the
//! entity-scoped DORA aggregate. Everything here runs as part of a
//! single-threaded batch pass over data already mirrored into the store.

pub mod attribution;
pub mod cfr;
pub mod correlation;
pub mod dashboard;
pub mod frequency;
pub mod graph;
pub mod mttr;
pub mod periods;

pub use attribution::{AttributionOutcome, LeadTimeAttributor};
pub use cfr::{CfrMetric, CfrService, DoraLevel};
pub use correlation::failed_deployment_ids;
pub use dashboard::{DashboardService, DoraReport, MetricsQuery};
pub use frequency::{DeploymentFrequency, DeploymentFrequencyService};
pub use graph::{ChildIndex, CommitGraph};
pub use mttr::{MttrMetric, MttrService};
pub use periods::{Granularity, Period};
