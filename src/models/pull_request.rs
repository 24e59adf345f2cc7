//! Pull request entity

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pull_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Identifier of the pull request at the source system
    #[sea_orm(unique)]
    pub external_id: i64,

    /// Repository this pull request belongs to
    pub repository_id: i64,

    /// Pull request number within the repository
    pub number: i32,

    /// Pull request title
    pub title: String,

    /// Author identity as reported by the source
    pub author: String,

    /// Lifecycle state as reported by the source ("open" / "closed")
    pub state: String,

    /// Timestamp the pull request was merged, if it was
    pub merged_at: Option<DateTimeWithTimeZone>,

    /// Sha of the first commit on the pull request branch
    pub first_commit_sha: Option<String>,

    /// Timestamp the pull request was created at the source
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp the pull request was last updated at the source
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
}

impl Related<super::repository::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repository.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
