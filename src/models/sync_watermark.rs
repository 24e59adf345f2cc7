//! Sync watermark entity
//!
//! One row per named sync job: the timestamp of its last successful run.
//! Bounds the "since" window of the next incremental fetch and must
//! survive process restarts.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_watermarks")]
pub struct Model {
    /// Name of the sync job (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub job_name: String,

    /// Timestamp of the job's last successful completion
    pub last_successful_run: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
