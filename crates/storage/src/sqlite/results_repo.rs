use async_trait::async_trait;
use exam_core::model::ExamResults;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_json, ser, to_json, write_error};
use crate::repository::{ResultsRepository, StorageError, StoredResults, validate_key};

fn map_results_row(row: &sqlx::sqlite::SqliteRow) -> Result<StoredResults, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let key: String = row.try_get("storage_key").map_err(ser)?;
    let payload: String = row.try_get("payload").map_err(ser)?;
    Ok(StoredResults {
        id,
        key,
        results: from_json(&payload)?,
    })
}

#[async_trait]
impl ResultsRepository for SqliteRepository {
    async fn save_results(&self, key: &str, results: &ExamResults) -> Result<i64, StorageError> {
        validate_key(key)?;
        let payload = to_json(results)?;

        let res = sqlx::query(
            r"
                INSERT INTO exam_results (
                    storage_key, attempt_id, assessment_id, total_score, recorded_at, payload
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(key)
        .bind(results.attempt_id().to_string())
        .bind(results.assessment_id())
        .bind(results.total_score())
        .bind(results.timestamp())
        .bind(payload)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_results(&self, key: &str) -> Result<Option<ExamResults>, StorageError> {
        let mut rows = self.list_results(key, 1).await?;
        Ok(rows.pop().map(|row| row.results))
    }

    async fn list_results(&self, key: &str, limit: u32) -> Result<Vec<StoredResults>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT id, storage_key, payload
                FROM exam_results
                WHERE storage_key = ?1
                ORDER BY id DESC
                LIMIT ?2
            ",
        )
        .bind(key)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_results_row).collect()
    }
}
