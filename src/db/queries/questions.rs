use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::randomize::VarRanges;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub content: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: i64,
    pub points: i64,
    pub variables: Option<Json<VarRanges>>,
    pub image_url: Option<String>,
    pub hint1: Option<String>,
    pub hint2: Option<String>,
    pub hint3: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub question_id: i64,
    pub content: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

pub async fn get_question(pool: &SqlitePool, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_questions_by_quiz(pool: &SqlitePool, quiz_id: i64) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE quiz_id = ?1 ORDER BY id")
        .bind(quiz_id)
        .fetch_all(pool)
        .await
}

pub async fn get_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>("SELECT * FROM questions ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_answers_by_question(pool: &SqlitePool, question_id: i64) -> sqlx::Result<Vec<Answer>> {
    sqlx::query_as::<_, Answer>("SELECT * FROM answers WHERE question_id = ?1 ORDER BY id")
        .bind(question_id)
        .fetch_all(pool)
        .await
}

pub async fn get_correct_answer(pool: &SqlitePool, question_id: i64) -> sqlx::Result<Option<Answer>> {
    sqlx::query_as::<_, Answer>(
        "SELECT * FROM answers WHERE question_id = ?1 AND is_correct = 1 LIMIT 1",
    )
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_answer(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Answer>> {
    sqlx::query_as::<_, Answer>("SELECT * FROM answers WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn create_question(
    pool: &SqlitePool,
    quiz_id: i64,
    content: &str,
    question_type: &str,
    difficulty: i64,
    points: i64,
    variables: Option<&VarRanges>,
    image_url: Option<&str>,
    hints: [Option<&str>; 3],
) -> anyhow::Result<i64> {
    let variables = variables.map(serde_json::to_string).transpose()?;
    let id = sqlx::query(
        r#"
        INSERT INTO questions
            (quiz_id, content, type, difficulty, points, variables, image_url, hint1, hint2, hint3)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(quiz_id)
    .bind(content)
    .bind(question_type)
    .bind(difficulty)
    .bind(points)
    .bind(variables)
    .bind(image_url)
    .bind(hints[0])
    .bind(hints[1])
    .bind(hints[2])
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn create_answer(
    pool: &SqlitePool,
    question_id: i64,
    content: &str,
    is_correct: bool,
    explanation: Option<&str>,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        "INSERT INTO answers (question_id, content, is_correct, explanation) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(question_id)
    .bind(content)
    .bind(is_correct)
    .bind(explanation)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_question(pool: &SqlitePool, question: &Question) -> anyhow::Result<()> {
    let variables = question
        .variables
        .as_ref()
        .map(|v| serde_json::to_string(&v.0))
        .transpose()?;
    sqlx::query(
        r#"
        UPDATE questions SET
            quiz_id = ?1, content = ?2, type = ?3, difficulty = ?4, points = ?5,
            variables = ?6, image_url = ?7, hint1 = ?8, hint2 = ?9, hint3 = ?10
        WHERE id = ?11
        "#,
    )
    .bind(question.quiz_id)
    .bind(&question.content)
    .bind(&question.question_type)
    .bind(question.difficulty)
    .bind(question.points)
    .bind(variables)
    .bind(&question.image_url)
    .bind(&question.hint1)
    .bind(&question.hint2)
    .bind(&question.hint3)
    .bind(question.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Answers go first, then the question itself.
pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM answers WHERE question_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM questions WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
