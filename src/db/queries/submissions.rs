use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuizSubmission {
    pub id: Uuid,
    pub user_id: Option<i64>,
    pub quiz_id: Option<i64>,
    pub progress_id: Option<i64>,
    pub completed_at: NaiveDateTime,
    pub score: i64,
    pub feedback: Option<String>,
    pub reviewed: bool,
}

pub async fn create_submission(
    pool: &SqlitePool,
    user_id: i64,
    quiz_id: i64,
    progress_id: i64,
    completed_at: NaiveDateTime,
    score: i64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO quiz_submissions (id, user_id, quiz_id, progress_id, completed_at, score)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(quiz_id)
    .bind(progress_id)
    .bind(completed_at)
    .bind(score)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn get_submissions_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Vec<QuizSubmission>> {
    sqlx::query_as::<_, QuizSubmission>(
        "SELECT * FROM quiz_submissions WHERE user_id = ?1 ORDER BY completed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_submissions_for_quiz(
    pool: &SqlitePool,
    quiz_id: i64,
) -> sqlx::Result<Vec<QuizSubmission>> {
    sqlx::query_as::<_, QuizSubmission>(
        "SELECT * FROM quiz_submissions WHERE quiz_id = ?1 ORDER BY completed_at DESC",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub async fn mark_reviewed(pool: &SqlitePool, id: Uuid, feedback: Option<&str>) -> sqlx::Result<()> {
    sqlx::query("UPDATE quiz_submissions SET reviewed = 1, feedback = ?1 WHERE id = ?2")
        .bind(feedback)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Only the latest feedback per attempt is kept.
pub async fn save_feedback(pool: &SqlitePool, progress_id: i64, feedback: &str) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM quiz_feedback WHERE progress_id = ?1")
        .bind(progress_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO quiz_feedback (progress_id, feedback) VALUES (?1, ?2)")
        .bind(progress_id)
        .bind(feedback)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

pub async fn get_feedback(pool: &SqlitePool, progress_id: i64) -> sqlx::Result<Option<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT feedback FROM quiz_feedback WHERE progress_id = ?1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(progress_id)
    .fetch_optional(pool)
    .await
}
