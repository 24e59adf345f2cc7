//! Migration to create the commit_parents table.
//!
//! One row per (child, parent) edge. Merge commits contribute two or more
//! rows; root commits contribute none. Edges point from child to ancestor.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CommitParents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommitParents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CommitParents::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(CommitParents::ChildSha).text().not_null())
                    .col(ColumnDef::new(CommitParents::ParentSha).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commit_parents_repository_id")
                            .from(CommitParents::Table, CommitParents::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commit_parents_child_parent")
                    .table(CommitParents::Table)
                    .col(CommitParents::ChildSha)
                    .col(CommitParents::ParentSha)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commit_parents_repository")
                    .table(CommitParents::Table)
                    .col(CommitParents::RepositoryId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_commit_parents_child_parent")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_commit_parents_repository")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(CommitParents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CommitParents {
    Table,
    Id,
    RepositoryId,
    ChildSha,
    ParentSha,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
}
