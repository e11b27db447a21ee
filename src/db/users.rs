use anyhow::anyhow;
use sqlx::{FromRow, PgPool};

use crate::auth;
use crate::error::{LibError, Result};
use crate::models::{LoginPayload, RegistrationPayload, UserData, UserId};

use super::{db_err, is_unique_violation};

#[derive(Debug, Clone, FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: i32,
    pub(crate) username: String,
    pub(crate) email: String,
}

impl From<UserRow> for UserData {
    fn from(value: UserRow) -> Self {
        Self {
            id: UserId(value.id),
            username: value.username,
            email: value.email,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct CredentialRow {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
}

pub async fn register_user(pool: &PgPool, payload: RegistrationPayload) -> Result<UserData> {
    let user = payload.normalize()?;
    let password_hash = auth::hash_password(user.password).await?;

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING id, username, email
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LibError::conflict(
                "Username or email already in use",
                anyhow!("duplicate registration for {}: {}", user.username, err),
            )
        } else {
            db_err("Failed to create user", err)
        }
    })?;

    tracing::info!(user_id = row.id, username = %row.username, "Registered user");
    Ok(row.into())
}

/// Checks a username (or email) and password pair.
pub async fn authenticate(pool: &PgPool, payload: LoginPayload) -> Result<UserData> {
    let login = payload.username.trim().to_string();
    let row = sqlx::query_as::<_, CredentialRow>(
        r#"
        SELECT id, username, email, password_hash
        FROM users
        WHERE username = $1 OR email = $1
        LIMIT 1
        "#,
    )
    .bind(&login)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query user", err))?;

    let Some(row) = row else {
        return Err(LibError::unauthorized(
            "Invalid username or password",
            anyhow!("no user named {:?}", login),
        ));
    };

    if !auth::verify_password(payload.password, row.password_hash).await? {
        return Err(LibError::unauthorized(
            "Invalid username or password",
            anyhow!("wrong password for user {}", row.id),
        ));
    }

    Ok(UserData {
        id: UserId(row.id),
        username: row.username,
        email: row.email,
    })
}

pub async fn get_user(pool: &PgPool, user_id: UserId) -> Result<UserData> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query user", err))?;

    row.map(UserData::from).ok_or_else(|| {
        LibError::token_missing(anyhow!("token names deleted user {}", user_id))
    })
}

pub async fn find_user(pool: &PgPool, username_or_email: &str) -> Result<Option<UserData>> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email
        FROM users
        WHERE username = $1 OR email = $1
        LIMIT 1
        "#,
    )
    .bind(username_or_email)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query user", err))?;

    Ok(row.map(UserData::from))
}
