//! Migration to create the lead_time_facts table.
//!
//! One fact per (commit, deployment) pair: the seconds between the commit
//! being authored and the deployment that first shipped it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LeadTimeFacts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LeadTimeFacts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LeadTimeFacts::CommitSha).text().not_null())
                    .col(
                        ColumnDef::new(LeadTimeFacts::DeploymentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LeadTimeFacts::LeadTimeSeconds)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lead_time_facts_deployment_id")
                            .from(LeadTimeFacts::Table, LeadTimeFacts::DeploymentId)
                            .to(Deployments::Table, Deployments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lead_time_facts_commit_deployment")
                    .table(LeadTimeFacts::Table)
                    .col(LeadTimeFacts::CommitSha)
                    .col(LeadTimeFacts::DeploymentId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_lead_time_facts_commit_deployment")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LeadTimeFacts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LeadTimeFacts {
    Table,
    Id,
    CommitSha,
    DeploymentId,
    LeadTimeSeconds,
}

#[derive(DeriveIden)]
enum Deployments {
    Table,
    Id,
}
