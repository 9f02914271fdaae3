use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub name: String,
    pub email: Option<String>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_sub: Option<String>,
    pub hint_credits: i64,
    pub tour_status: Option<Json<serde_json::Map<String, serde_json::Value>>>,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn is_parent(&self) -> bool {
        self.role == "parent"
    }
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_google_sub(pool: &SqlitePool, sub: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_sub = ?1")
        .bind(sub)
        .fetch_optional(pool)
        .await
}

pub async fn get_users(pool: &SqlitePool) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn create_user(
    pool: &SqlitePool,
    username: &str,
    password_hash: &str,
    name: &str,
    email: Option<&str>,
    role: &str,
    google_sub: Option<&str>,
) -> anyhow::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO users (username, password, name, email, role, google_sub)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(google_sub)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    email: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET name = ?1, email = ?2 WHERE id = ?3")
        .bind(name)
        .bind(email)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_role(pool: &SqlitePool, id: i64, role: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
        .bind(role)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_password(pool: &SqlitePool, id: i64, password_hash: &str) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET password = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Overwrite the stored tour flags with an already-merged map.
pub async fn set_tour_status(
    pool: &SqlitePool,
    id: i64,
    status: &serde_json::Map<String, serde_json::Value>,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET tour_status = ?1 WHERE id = ?2")
        .bind(serde_json::to_string(status)?)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn adjust_hint_credits(pool: &SqlitePool, id: i64, delta: i64) -> sqlx::Result<()> {
    sqlx::query("UPDATE users SET hint_credits = MAX(hint_credits + ?1, 0) WHERE id = ?2")
        .bind(delta)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn create_reset_token(
    pool: &SqlitePool,
    token: &str,
    user_id: i64,
    expires_at: NaiveDateTime,
) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
    )
    .bind(token)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete the token and return its user id, provided it has not expired.
pub async fn consume_reset_token(
    pool: &SqlitePool,
    token: &str,
    now: NaiveDateTime,
) -> sqlx::Result<Option<i64>> {
    let row: Option<(i64, NaiveDateTime)> = sqlx::query_as(
        "SELECT user_id, expires_at FROM password_reset_tokens WHERE token = ?1",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let Some((user_id, expires_at)) = row else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM password_reset_tokens WHERE token = ?1")
        .bind(token)
        .execute(pool)
        .await?;

    if expires_at < now {
        return Ok(None);
    }
    Ok(Some(user_id))
}
