//! Lead-time fact entity
//!
//! Association between a commit and the deployment that first shipped it,
//! created at most once per (commit, deployment) pair.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lead_time_facts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Sha of the attributed commit
    pub commit_sha: String,

    /// Deployment that first shipped the commit
    pub deployment_id: i64,

    /// Deployment created_at minus commit authored_at, in seconds. Negative
    /// values indicate clock skew or misordered sync and are tolerated.
    pub lead_time_seconds: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deployment::Entity",
        from = "Column::DeploymentId",
        to = "super::deployment::Column::Id"
    )]
    Deployment,
}

impl Related<super::deployment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deployment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
