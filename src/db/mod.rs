pub mod queries;

use sqlx::sqlite::SqlitePool;

pub use queries::categories::{Category, Subcategory};
pub use queries::progress::{StudentAnswer, StudentProgress};
pub use queries::questions::{Answer, Question};
pub use queries::quizzes::Quiz;
pub use queries::submissions::QuizSubmission;
pub use queries::users::User;

use sqlx::Error;

pub async fn establish_connection(path: &str) -> Result<SqlitePool, Error> {
    SqlitePool::connect(format!("sqlite:{}?mode=rwc", path).as_str()).await
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
