use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

use super::questions::{self, Answer, Question};
use super::quizzes::{self, Quiz};
use crate::randomize::VarValues;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,
    pub status: String,
    pub score: Option<i64>,
    pub completed_questions: i64,
    pub time_spent: Option<i64>,
    pub hints_used: i64,
    pub is_mini: bool,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub id: i64,
    pub progress_id: i64,
    pub question_id: i64,
    pub answer_id: Option<i64>,
    pub is_correct: Option<bool>,
    pub variables: Option<Json<VarValues>>,
    pub time_spent: Option<i64>,
}

/// One graded answer in a results view, with the question it belongs to, the
/// option the student picked and the correct option.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    #[serde(flatten)]
    pub answer: StudentAnswer,
    pub question: Question,
    pub answer_details: Option<Answer>,
    pub correct_answer: Option<Answer>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub progress: StudentProgress,
    pub quiz: Quiz,
    pub answers: Vec<AnswerResult>,
}

pub async fn get_progress_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<StudentProgress>> {
    sqlx::query_as::<_, StudentProgress>(
        "SELECT * FROM student_progress WHERE user_id = ?1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_progress(pool: &SqlitePool, id: i64) -> sqlx::Result<StudentProgress> {
    sqlx::query_as::<_, StudentProgress>("SELECT * FROM student_progress WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_progress_for_quiz(
    pool: &SqlitePool,
    user_id: i64,
    quiz_id: i64,
) -> sqlx::Result<Option<StudentProgress>> {
    sqlx::query_as::<_, StudentProgress>(
        "SELECT * FROM student_progress WHERE user_id = ?1 AND quiz_id = ?2 ORDER BY id DESC LIMIT 1",
    )
    .bind(user_id)
    .bind(quiz_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_progress(
    pool: &SqlitePool,
    user_id: i64,
    quiz_id: i64,
    is_mini: bool,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO student_progress (user_id, quiz_id, status, is_mini)
        VALUES (?1, ?2, 'in_progress', ?3)
        "#,
    )
    .bind(user_id)
    .bind(quiz_id)
    .bind(is_mini)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn complete_progress(
    pool: &SqlitePool,
    id: i64,
    score: i64,
    completed_questions: i64,
    time_spent: Option<i64>,
    completed_at: NaiveDateTime,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE student_progress
        SET status = 'completed', score = ?1, completed_questions = ?2,
            time_spent = ?3, completed_at = ?4
        WHERE id = ?5
        "#,
    )
    .bind(score)
    .bind(completed_questions)
    .bind(time_spent)
    .bind(completed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn increment_hints_used(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE student_progress SET hints_used = hints_used + 1 WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Re-answering a question overwrites the previous attempt within the same
/// progress row.
pub async fn record_answer(
    pool: &SqlitePool,
    progress_id: i64,
    question_id: i64,
    answer_id: Option<i64>,
    is_correct: Option<bool>,
    variables: Option<&VarValues>,
    time_spent: Option<i64>,
) -> anyhow::Result<i64> {
    let variables = variables.map(serde_json::to_string).transpose()?;
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM student_answers WHERE progress_id = ?1 AND question_id = ?2")
        .bind(progress_id)
        .bind(question_id)
        .execute(&mut *tx)
        .await?;
    let id = sqlx::query(
        r#"
        INSERT INTO student_answers
            (progress_id, question_id, answer_id, is_correct, variables, time_spent)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(progress_id)
    .bind(question_id)
    .bind(answer_id)
    .bind(is_correct)
    .bind(variables)
    .bind(time_spent)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();
    sqlx::query(
        r#"
        UPDATE student_progress
        SET completed_questions =
            (SELECT COUNT(*) FROM student_answers WHERE progress_id = ?1)
        WHERE id = ?1
        "#,
    )
    .bind(progress_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(id)
}

pub async fn get_answers_for_progress(
    pool: &SqlitePool,
    progress_id: i64,
) -> sqlx::Result<Vec<StudentAnswer>> {
    sqlx::query_as::<_, StudentAnswer>(
        "SELECT * FROM student_answers WHERE progress_id = ?1 ORDER BY id",
    )
    .bind(progress_id)
    .fetch_all(pool)
    .await
}

/// Full results view for one attempt: the progress row, its quiz, and every
/// recorded answer enriched with the question, the chosen option and the
/// correct option.
pub async fn get_results(pool: &SqlitePool, progress_id: i64) -> anyhow::Result<QuizResult> {
    let progress = get_progress(pool, progress_id).await?;
    let quiz = quizzes::get_quiz(pool, progress.quiz_id).await?;
    let recorded = get_answers_for_progress(pool, progress_id).await?;

    let mut answers = Vec::with_capacity(recorded.len());
    for answer in recorded {
        let question = questions::get_question(pool, answer.question_id).await?;
        let answer_details = match answer.answer_id {
            Some(id) => questions::get_answer(pool, id).await?,
            None => None,
        };
        let correct_answer = questions::get_correct_answer(pool, answer.question_id).await?;
        answers.push(AnswerResult {
            answer,
            question,
            answer_details,
            correct_answer,
        });
    }

    Ok(QuizResult {
        progress,
        quiz,
        answers,
    })
}
