//! Migration to create the commits table.
//!
//! Commits are keyed by their content hash and immutable once stored; the
//! parent edges that complete the ancestry graph live in commit_parents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Commits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Commits::Sha).text().not_null().primary_key())
                    .col(ColumnDef::new(Commits::RepositoryId).big_integer().not_null())
                    .col(ColumnDef::new(Commits::Author).text().not_null())
                    .col(ColumnDef::new(Commits::Message).text().not_null())
                    .col(
                        ColumnDef::new(Commits::AuthoredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_commits_repository_id")
                            .from(Commits::Table, Commits::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_commits_repository_author")
                    .table(Commits::Table)
                    .col(Commits::RepositoryId)
                    .col(Commits::Author)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_commits_repository_author").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Commits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Commits {
    Table,
    Sha,
    RepositoryId,
    Author,
    Message,
    AuthoredAt,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
}
