//! Weekly recommendation database operations

use chrono::NaiveDate;
use farmsight_common::Result;
use sqlx::{SqliteConnection, SqliteExecutor};

use crate::models::{PaddockRecommendation, Recommendation};

pub async fn insert<'e, E: SqliteExecutor<'e>>(db: E, rec: &Recommendation) -> Result<()> {
    sqlx::query(
        "INSERT INTO recommendations (id, farm_id, created_for_week_start, summary_md, created_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&rec.id)
    .bind(&rec.farm_id)
    .bind(rec.created_for_week_start)
    .bind(&rec.summary_md)
    .bind(rec.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_child<'e, E: SqliteExecutor<'e>>(
    db: E,
    row: &PaddockRecommendation,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO paddock_recommendations \
         (id, recommendation_id, paddock_id, rec_type, message, severity, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.recommendation_id)
    .bind(&row.paddock_id)
    .bind(row.rec_type)
    .bind(&row.message)
    .bind(row.severity)
    .bind(row.created_at)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn find_for_week<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
    week_start: NaiveDate,
) -> Result<Option<Recommendation>> {
    let rec = sqlx::query_as::<_, Recommendation>(
        "SELECT * FROM recommendations WHERE farm_id = ? AND created_for_week_start = ?",
    )
    .bind(farm_id)
    .bind(week_start)
    .fetch_optional(db)
    .await?;
    Ok(rec)
}

pub async fn latest_for_farm<'e, E: SqliteExecutor<'e>>(
    db: E,
    farm_id: &str,
) -> Result<Option<Recommendation>> {
    let rec = sqlx::query_as::<_, Recommendation>(
        "SELECT * FROM recommendations WHERE farm_id = ? \
         ORDER BY created_for_week_start DESC LIMIT 1",
    )
    .bind(farm_id)
    .fetch_optional(db)
    .await?;
    Ok(rec)
}

pub async fn children<'e, E: SqliteExecutor<'e>>(
    db: E,
    recommendation_id: &str,
) -> Result<Vec<PaddockRecommendation>> {
    let rows = sqlx::query_as::<_, PaddockRecommendation>(
        "SELECT * FROM paddock_recommendations WHERE recommendation_id = ? \
         ORDER BY created_at ASC",
    )
    .bind(recommendation_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Delete a recommendation and its child rows. Run inside a
/// transaction so a replacement never leaves a half-deleted week.
pub async fn delete_with_children(conn: &mut SqliteConnection, recommendation_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM paddock_recommendations WHERE recommendation_id = ?")
        .bind(recommendation_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM recommendations WHERE id = ?")
        .bind(recommendation_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
