use async_trait::async_trait;
use chrono::Utc;
use exam_core::model::Assessment;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, from_json, ser, to_json};
use crate::repository::{AssessmentRepository, StorageError, validate_key};

#[async_trait]
impl AssessmentRepository for SqliteRepository {
    async fn upsert_assessment(&self, assessment: &Assessment) -> Result<(), StorageError> {
        validate_key(&assessment.id)?;
        let document = to_json(assessment)?;

        sqlx::query(
            r"
            INSERT INTO assessments (id, title, document, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(&assessment.id)
        .bind(&assessment.title)
        .bind(document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_assessment(&self, id: &str) -> Result<Assessment, StorageError> {
        let row = sqlx::query("SELECT document FROM assessments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let document: String = row.try_get("document").map_err(ser)?;
        from_json(&document)
    }
}
