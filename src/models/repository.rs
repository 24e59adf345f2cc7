//! Repository configuration entity
//!
//! One row per mirrored source repository: its URL, parsed owner/name, and
//! the optional service name used to correlate incidents with deployments.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Repository entity configuring one mirrored source repository
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "repositories")]
pub struct Model {
    /// Unique identifier for the repository (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Canonical URL of the source repository
    #[sea_orm(unique)]
    pub url: String,

    /// Owner segment parsed from the URL
    pub owner: String,

    /// Name segment parsed from the URL
    pub name: String,

    /// Service name used to correlate incidents (optional)
    pub service_name: Option<String>,

    /// Workflow file that produces deployment runs (optional)
    pub deployment_workflow: Option<String>,

    /// Timestamp when the row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::commit::Entity")]
    Commits,
    #[sea_orm(has_many = "super::deployment::Entity")]
    Deployments,
    #[sea_orm(has_many = "super::incident::Entity")]
    Incidents,
}

impl Related<super::commit::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Commits.def()
    }
}

impl Related<super::deployment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deployments.def()
    }
}

impl Related<super::incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
