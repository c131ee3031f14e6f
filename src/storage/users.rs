//! Credential store: user records and password-reset tokens.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::model::{PasswordResetToken, Role, User};

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Role is fixed by the caller, never by the request body.
pub async fn insert(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
    role: Role,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, role) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(role)
    .fetch_one(pool)
    .await
}

pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    email: Option<&str>,
    name: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET email = COALESCE($2, email), name = COALESCE($3, name) \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(email)
    .bind(name)
    .fetch_one(pool)
    .await
}

pub async fn update_role(pool: &PgPool, id: i64, role: Role) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("UPDATE users SET role = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
}

pub async fn insert_reset_token(
    pool: &PgPool,
    user_id: i64,
    token: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO password_reset_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn find_reset_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<PasswordResetToken>, sqlx::Error> {
    sqlx::query_as::<_, PasswordResetToken>("SELECT * FROM password_reset_tokens WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Rewrites the password hash and burns the token in one transaction.
pub async fn consume_reset_token(
    pool: &PgPool,
    token_id: i64,
    user_id: i64,
    new_password_hash: &str,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
        .bind(user_id)
        .bind(new_password_hash)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM password_reset_tokens WHERE id = $1")
        .bind(token_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
