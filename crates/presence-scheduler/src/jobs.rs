//! Job type definitions and the scheduled-jobs store.

use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum JobType {
    CheckDns,
    CheckWebsite,
}

impl JobType {
    /// The check family this job drives.
    pub fn check_type(self) -> presence_core::CheckType {
        match self {
            Self::CheckDns => presence_core::CheckType::Dns,
            Self::CheckWebsite => presence_core::CheckType::Website,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub id: String,
    pub job_type: JobType,
    pub interval_days: u32,
    pub next_run_at: String,
    pub last_run_at: Option<String>,
    pub enabled: bool,
}

/// Get all scheduled jobs.
pub async fn get_scheduled_jobs(pool: &Pool<Sqlite>) -> Result<Vec<ScheduledJob>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String, i64, String, Option<String>, i64)>(
        r"SELECT id, job_type, interval_days, next_run_at, last_run_at, enabled
           FROM scheduled_jobs",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(
            |(id, job_type_str, interval_days, next_run_at, last_run_at, enabled)| {
                let job_type: JobType = serde_json::from_str(&format!("\"{job_type_str}\""))
                    .map_err(|e| {
                        sqlx::Error::Decode(
                            format!("Invalid job_type '{job_type_str}' in scheduled_jobs table: {e}")
                                .into(),
                        )
                    })?;
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                let interval_days = interval_days as u32;
                Ok(ScheduledJob {
                    id,
                    job_type,
                    interval_days,
                    next_run_at,
                    last_run_at,
                    enabled: enabled != 0,
                })
            },
        )
        .collect()
}

/// Update a job's `next_run_at` and `last_run_at` timestamps.
pub async fn update_job_next_run(
    pool: &Pool<Sqlite>,
    job_id: &str,
    next_run_at: &str,
    last_run_at: &str,
) -> Result<(), sqlx::Error> {
    let result =
        sqlx::query("UPDATE scheduled_jobs SET next_run_at = ?, last_run_at = ? WHERE id = ?")
            .bind(next_run_at)
            .bind(last_run_at)
            .bind(job_id)
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }

    Ok(())
}
