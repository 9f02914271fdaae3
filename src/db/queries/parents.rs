use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Child {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
}

pub async fn get_children(pool: &SqlitePool, parent_user_id: i64) -> sqlx::Result<Vec<Child>> {
    sqlx::query_as::<_, Child>(
        r#"
        SELECT users.id, users.name, users.email FROM users
        JOIN parents ON parents.child_user_id = users.id
        WHERE parents.parent_user_id = ?1
        ORDER BY users.name
        "#,
    )
    .bind(parent_user_id)
    .fetch_all(pool)
    .await
}

pub async fn is_child_of(pool: &SqlitePool, parent_user_id: i64, child_user_id: i64) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM parents WHERE parent_user_id = ?1 AND child_user_id = ?2",
    )
    .bind(parent_user_id)
    .bind(child_user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn link_child(pool: &SqlitePool, parent_user_id: i64, child_user_id: i64) -> sqlx::Result<()> {
    sqlx::query("INSERT OR IGNORE INTO parents (parent_user_id, child_user_id) VALUES (?1, ?2)")
        .bind(parent_user_id)
        .bind(child_user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn unlink_child(pool: &SqlitePool, parent_user_id: i64, child_user_id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM parents WHERE parent_user_id = ?1 AND child_user_id = ?2")
        .bind(parent_user_id)
        .bind(child_user_id)
        .execute(pool)
        .await?;
    Ok(())
}
