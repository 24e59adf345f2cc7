//! Migration to create the deployments table.
//!
//! A deployment is one release event to an environment. The
//! lead_time_processed flag is the unit of idempotent attribution: it
//! transitions false to true exactly once and is never reverted.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Deployments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Deployments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Deployments::ExternalId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Deployments::RepositoryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Deployments::Name).text().null())
                    .col(ColumnDef::new(Deployments::Sha).text().not_null())
                    .col(ColumnDef::new(Deployments::Environment).text().null())
                    .col(ColumnDef::new(Deployments::ServiceName).text().null())
                    .col(
                        ColumnDef::new(Deployments::LeadTimeProcessed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Deployments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Deployments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_deployments_repository_id")
                            .from(Deployments::Table, Deployments::RepositoryId)
                            .to(Repositories::Table, Repositories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Attribution scans unprocessed deployments per environment in
        // creation order.
        manager
            .create_index(
                Index::create()
                    .name("idx_deployments_env_processed_created")
                    .table(Deployments::Table)
                    .col(Deployments::Environment)
                    .col(Deployments::LeadTimeProcessed)
                    .col(Deployments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_deployments_repository_created")
                    .table(Deployments::Table)
                    .col(Deployments::RepositoryId)
                    .col(Deployments::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_deployments_env_processed_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_deployments_repository_created")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Deployments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Deployments {
    Table,
    Id,
    ExternalId,
    RepositoryId,
    Name,
    Sha,
    Environment,
    ServiceName,
    LeadTimeProcessed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Repositories {
    Table,
    Id,
}
