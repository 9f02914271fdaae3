use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub time_limit: i64,
    pub difficulty: String,
    pub total_questions: i64,
    pub is_public: bool,
}

pub async fn get_quizzes(pool: &SqlitePool) -> sqlx::Result<Vec<Quiz>> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_public_quizzes(pool: &SqlitePool) -> sqlx::Result<Vec<Quiz>> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE is_public = 1 ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_quiz(pool: &SqlitePool, id: i64) -> sqlx::Result<Quiz> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_quizzes_by_category(pool: &SqlitePool, category_id: i64) -> sqlx::Result<Vec<Quiz>> {
    sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE category_id = ?1 ORDER BY id")
        .bind(category_id)
        .fetch_all(pool)
        .await
}

#[allow(clippy::too_many_arguments)]
pub async fn create_quiz(
    pool: &SqlitePool,
    title: &str,
    description: &str,
    category_id: i64,
    subcategory_id: Option<i64>,
    time_limit: i64,
    difficulty: &str,
    total_questions: i64,
    is_public: bool,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO quizzes
            (title, description, category_id, subcategory_id, time_limit, difficulty, total_questions, is_public)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(category_id)
    .bind(subcategory_id)
    .bind(time_limit)
    .bind(difficulty)
    .bind(total_questions)
    .bind(is_public)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_quiz(pool: &SqlitePool, quiz: Quiz) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE quizzes SET
            title = ?1, description = ?2, category_id = ?3, subcategory_id = ?4,
            time_limit = ?5, difficulty = ?6, total_questions = ?7, is_public = ?8
        WHERE id = ?9
        "#,
    )
    .bind(&quiz.title)
    .bind(&quiz.description)
    .bind(quiz.category_id)
    .bind(quiz.subcategory_id)
    .bind(quiz.time_limit)
    .bind(&quiz.difficulty)
    .bind(quiz.total_questions)
    .bind(quiz.is_public)
    .bind(quiz.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_quiz(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM user_quizzes WHERE quiz_id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM quizzes WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Quizzes explicitly assigned to a student.
pub async fn get_quizzes_for_user(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<Quiz>> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT quizzes.* FROM quizzes
        JOIN user_quizzes ON user_quizzes.quiz_id = quizzes.id
        WHERE user_quizzes.user_id = ?1
        ORDER BY quizzes.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn assign_quiz(pool: &SqlitePool, user_id: i64, quiz_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT OR IGNORE INTO user_quizzes (user_id, quiz_id) VALUES (?1, ?2)")
        .bind(user_id)
        .bind(quiz_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn unassign_quiz(pool: &SqlitePool, user_id: i64, quiz_id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM user_quizzes WHERE user_id = ?1 AND quiz_id = ?2")
        .bind(user_id)
        .bind(quiz_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Users a quiz has been assigned to (admin view).
pub async fn get_assignees(pool: &SqlitePool, quiz_id: i64) -> sqlx::Result<Vec<i64>> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM user_quizzes WHERE quiz_id = ?1")
        .bind(quiz_id)
        .fetch_all(pool)
        .await
}
