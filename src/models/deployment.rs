//! Deployment entity
//!
//! One release event to an environment. `lead_time_processed` is the unit
//! of idempotent attribution: once true, the deployment is never
//! reattributed.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deployments")]
pub struct Model {
    /// Unique identifier for the deployment (primary key)
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Identifier of the run at the source system
    #[sea_orm(unique)]
    pub external_id: i64,

    /// Repository this deployment belongs to
    pub repository_id: i64,

    /// Display name of the run at the source (optional)
    pub name: Option<String>,

    /// Sha of the commit this deployment shipped
    pub sha: String,

    /// Target environment, e.g. "production" (optional)
    pub environment: Option<String>,

    /// Service name used to correlate incidents (optional)
    pub service_name: Option<String>,

    /// Whether lead-time attribution has run for this deployment
    pub lead_time_processed: bool,

    /// Timestamp the deployment was created at the source
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp the deployment was last updated at the source
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::repository::Entity",
        from = "Column::RepositoryId",
        to = "super::repository::Column::Id"
    )]
    Repository,
    #[sea_orm(has_many = "super::lead_time_fact::Entity")]
    LeadTimeFacts,
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl Related<super::lead_time_fact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LeadTimeFacts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
