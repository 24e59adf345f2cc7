//! Migration to create the sync_watermarks table.
//!
//! One row per named sync job: the timestamp of its last successful run,
//! bounding the "since" window of the next incremental fetch.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SyncWatermarks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SyncWatermarks::JobName)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SyncWatermarks::LastSuccessfulRun)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SyncWatermarks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SyncWatermarks {
    Table,
    JobName,
    LastSuccessfulRun,
}
