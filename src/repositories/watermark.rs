//! # Sync Watermark Store
//!
//! Keyed job-name → last-successful-run store bounding incremental fetches.
//! Injected into each sync service rather than held as ambient state, so a
//! batch runner only ever advances its own keys.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::error::RepositoryError;
use crate::models::sync_watermark::{self, Entity as SyncWatermark};

pub struct WatermarkStore<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WatermarkStore<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// The "since" bound for a job: its last successful run, or `now` minus
    /// the configured lookback on the first run (never the epoch).
    pub async fn since(
        &self,
        job_name: &str,
        lookback_days: u32,
    ) -> Result<DateTime<Utc>, RepositoryError> {
        let stored = SyncWatermark::find_by_id(job_name)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(match stored {
            Some(row) => row.last_successful_run.with_timezone(&Utc),
            None => Utc::now() - Duration::days(i64::from(lookback_days)),
        })
    }

    /// Record a successful completion for a job, moving its watermark to
    /// `completed_at`.
    pub async fn advance(
        &self,
        job_name: &str,
        completed_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let existing = SyncWatermark::find_by_id(job_name)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        match existing {
            Some(row) => {
                let mut active: sync_watermark::ActiveModel = row.into();
                active.last_successful_run = Set(completed_at.into());
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
            }
            None => {
                let row = sync_watermark::ActiveModel {
                    job_name: Set(job_name.to_string()),
                    last_successful_run: Set(completed_at.into()),
                };
                row.insert(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?;
            }
        }

        Ok(())
    }
}
