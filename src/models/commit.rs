//! Commit entity
//!
//! Commits are keyed by their content hash and are immutable once stored.
//! Parent edges live in `commit_parent`; together they form a DAG per
//! repository with edges pointing from child to ancestor.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "commits")]
pub struct Model {
    /// Content hash of the commit (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub sha: String,

    /// Repository this commit belongs to
    pub repository_id: i64,

    /// Author identity as reported by the source
    pub author: String,

    /// Commit message
    pub message: String,

    /// Timestamp the commit was authored
    pub authored_at: DateTimeWithTimeZone,
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
