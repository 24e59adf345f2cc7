//! Database migrations for the DORA metrics engine.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_10_100000_create_repositories;
mod m2026_01_10_100100_create_commits;
mod m2026_01_10_100200_create_commit_parents;
mod m2026_01_10_100300_create_deployments;
mod m2026_01_10_100400_create_lead_time_facts;
mod m2026_01_10_100500_create_incidents;
mod m2026_01_10_100600_create_pull_requests;
mod m2026_01_10_100700_create_sync_watermarks;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_10_100000_create_repositories::Migration),
            Box::new(m2026_01_10_100100_create_commits::Migration),
            Box::new(m2026_01_10_100200_create_commit_parents::Migration),
            Box::new(m2026_01_10_100300_create_deployments::Migration),
            Box::new(m2026_01_10_100400_create_lead_time_facts::Migration),
            Box::new(m2026_01_10_100500_create_incidents::Migration),
            Box::new(m2026_01_10_100600_create_pull_requests::Migration),
            Box::new(m2026_01_10_100700_create_sync_watermarks::Migration),
        ]
    }
}
