//! Job run database operations
//!
//! Every tracked pipeline execution gets exactly one `start` and one
//! `finish`. The running row is committed before the wrapped work
//! begins so it is visible to observers mid-run; the terminal update
//! happens once and the row is never touched again.

use farmsight_common::{time, Result};
use sqlx::types::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{JobRun, JobStatus, JobType};

/// Create and persist a running job record
pub async fn start(pool: &SqlitePool, job_type: JobType, farm_id: Option<&str>) -> Result<JobRun> {
    let run = JobRun {
        id: Uuid::new_v4().to_string(),
        job_type,
        farm_id: farm_id.map(str::to_string),
        status: JobStatus::Running,
        started_at: time::now(),
        finished_at: None,
        stats_json: Json(serde_json::json!({})),
        error: None,
    };
    sqlx::query(
        "INSERT INTO job_runs (id, job_type, farm_id, status, started_at, stats_json) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&run.id)
    .bind(run.job_type)
    .bind(&run.farm_id)
    .bind(run.status)
    .bind(run.started_at)
    .bind(&run.stats_json)
    .execute(pool)
    .await?;
    Ok(run)
}

/// Set the terminal status, stats and error of a run
pub async fn finish(
    pool: &SqlitePool,
    run_id: &str,
    status: JobStatus,
    stats: serde_json::Value,
    error: Option<String>,
) -> Result<()> {
    sqlx::query(
        "UPDATE job_runs SET status = ?, finished_at = ?, stats_json = ?, error = ? WHERE id = ?",
    )
    .bind(status)
    .bind(time::now())
    .bind(Json(stats))
    .bind(error)
    .bind(run_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Run history, newest first, optionally filtered by farm
pub async fn list(pool: &SqlitePool, farm_id: Option<&str>, limit: i64) -> Result<Vec<JobRun>> {
    let rows = match farm_id {
        Some(farm_id) => {
            sqlx::query_as::<_, JobRun>(
                "SELECT * FROM job_runs WHERE farm_id = ? ORDER BY started_at DESC LIMIT ?",
            )
            .bind(farm_id)
            .bind(limit)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, JobRun>("SELECT * FROM job_runs ORDER BY started_at DESC LIMIT ?")
                .bind(limit)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}
