//! Commit parent-edge entity
//!
//! One row per (child, parent) edge within a repository. Merge commits
//! contribute two or more rows; root commits contribute none.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commit_parents")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Repository both endpoints belong to
    pub repository_id: i64,

    /// Sha of the child commit
    pub child_sha: String,

    /// Sha of the parent (ancestor-direction) commit
    pub parent_sha: String,
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
