//! Incident entity
//!
//! Incidents are keyed by their external id and updated in place as they
//! evolve. `duration_seconds` is populated only once the incident resolves.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "incidents")]
pub struct Model {
    /// Unique identifier for the incident (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Identifier of the incident at the source system
    #[sea_orm(unique)]
    pub external_id: String,

    /// Repository this incident is associated with
    pub repository_id: i64,

    /// Incident title
    pub title: String,

    /// Current lifecycle state
    pub state: IncidentState,

    /// Severity as reported by the source
    pub severity: IncidentSeverity,

    /// Timestamp the incident started
    pub started_at: DateTimeWithTimeZone,

    /// Timestamp the incident was resolved, if it has been
    pub resolved_at: Option<DateTimeWithTimeZone>,

    /// Seconds from start to resolution; populated only when resolved
    pub duration_seconds: Option<i64>,

    /// Service name this incident is associated with (optional)
    pub service_name: Option<String>,

    /// Timestamp when the row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

/// Incident lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum IncidentState {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "STABLE")]
    Stable,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
}

/// Incident severity, SEV1 (highest) through SEV5 (lowest)
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum IncidentSeverity {
    #[sea_orm(string_value = "SEV1")]
    Sev1,
    #[sea_orm(string_value = "SEV2")]
    Sev2,
    #[sea_orm(string_value = "SEV3")]
    Sev3,
    #[sea_orm(string_value = "SEV4")]
    Sev4,
    #[sea_orm(string_value = "SEV5")]
    Sev5,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
