use std::fmt;

use anyhow::anyhow;
use once_cell::sync::Lazy;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{NodeId, NodeTypeId, ProjectId, UserId};
use crate::permissions::{self, Access, Permissions, ProjectAccess};

pub mod assignments;
pub mod comments;
pub mod edges;
pub mod node_types;
pub mod nodes;
pub mod projects;
pub mod users;

pub static MIGRATOR: Lazy<Migrator> = Lazy::new(|| sqlx::migrate!("./migrations"));

pub async fn create_board_tables(pool: &PgPool) -> std::result::Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Drops every table in the `public` schema and recreates the schema empty.
///
/// Development only: the binary calls this after a failed migration when it
/// was started with `--reset-schema-on-migration-failure`.
pub async fn reset_public_schema(pool: &PgPool) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    for statement in [
        "DROP SCHEMA public CASCADE",
        "CREATE SCHEMA public",
        "GRANT ALL ON SCHEMA public TO public",
        "COMMENT ON SCHEMA public IS 'standard public schema'",
    ] {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|err| db_err("Failed to reset public schema", err))?;
    }

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))
}

pub(crate) fn db_err(public: &'static str, err: sqlx::Error) -> LibError {
    LibError::database(public, anyhow!(err))
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_error| db_error.is_unique_violation())
}

/// Maps a write rejected by `actor_fkey` (the row's reference to the
/// requesting user) to a token error: the token names a deleted account.
pub(crate) fn actor_write_err(
    public: &'static str,
    actor: UserId,
    actor_fkey: &str,
    err: sqlx::Error,
) -> LibError {
    let stale_actor = err.as_database_error().is_some_and(|db_error| {
        db_error.is_foreign_key_violation() && db_error.constraint() == Some(actor_fkey)
    });
    if stale_actor {
        LibError::token_missing(anyhow!("token names deleted user {}", actor))
    } else {
        db_err(public, err)
    }
}

#[derive(Debug, Clone, FromRow)]
struct AccessRow {
    project_id: i32,
    owner_id: i32,
    public_view: bool,
    public_edit: bool,
    is_member: bool,
}

impl From<AccessRow> for ProjectAccess {
    fn from(value: AccessRow) -> Self {
        Self {
            project_id: ProjectId(value.project_id),
            owner_id: UserId(value.owner_id),
            public_view: value.public_view,
            public_edit: value.public_edit,
            is_member: value.is_member,
        }
    }
}

async fn load_project_access(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Option<ProjectAccess>> {
    let row = sqlx::query_as::<_, AccessRow>(
        r#"
        SELECT
            p.id AS project_id,
            p.owner_id,
            p.public_view,
            p.public_edit,
            EXISTS (
                SELECT 1
                FROM users__project up
                WHERE up.project_id = p.id
                  AND up.users_id = $2
            ) AS is_member
        FROM project p
        WHERE p.id = $1
        "#,
    )
    .bind(project_id.0)
    .bind(actor.map(|id| id.0))
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query project", err))?;

    Ok(row.map(ProjectAccess::from))
}

async fn load_node_access(
    pool: &PgPool,
    actor: Option<UserId>,
    node_id: NodeId,
) -> Result<Option<ProjectAccess>> {
    let row = sqlx::query_as::<_, AccessRow>(
        r#"
        SELECT
            p.id AS project_id,
            p.owner_id,
            p.public_view,
            p.public_edit,
            EXISTS (
                SELECT 1
                FROM users__project up
                WHERE up.project_id = p.id
                  AND up.users_id = $2
            ) AS is_member
        FROM node n
        JOIN project p
        ON p.id = n.project_id
        WHERE n.id = $1
        "#,
    )
    .bind(node_id.0)
    .bind(actor.map(|id| id.0))
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query node project", err))?;

    Ok(row.map(ProjectAccess::from))
}

async fn load_node_type_access(
    pool: &PgPool,
    actor: Option<UserId>,
    type_id: NodeTypeId,
) -> Result<Option<ProjectAccess>> {
    let row = sqlx::query_as::<_, AccessRow>(
        r#"
        SELECT
            p.id AS project_id,
            p.owner_id,
            p.public_view,
            p.public_edit,
            EXISTS (
                SELECT 1
                FROM users__project up
                WHERE up.project_id = p.id
                  AND up.users_id = $2
            ) AS is_member
        FROM node_type t
        JOIN project p
        ON p.id = t.project_id
        WHERE t.id = $1
        "#,
    )
    .bind(type_id.0)
    .bind(actor.map(|id| id.0))
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query node type project", err))?;

    Ok(row.map(ProjectAccess::from))
}

fn require(
    access: Option<ProjectAccess>,
    actor: Option<UserId>,
    needed: Access,
    target: impl fmt::Display,
) -> Result<ProjectAccess> {
    let Some(access) = access else {
        return Err(LibError::no_permission(anyhow!("{} not found", target)));
    };

    if permissions::evaluate(&access, actor).allows(needed) {
        Ok(access)
    } else {
        Err(LibError::no_permission(anyhow!(
            "{:?} access to {} denied for {}",
            needed,
            target,
            actor.map_or_else(|| "anonymous".to_string(), |id| format!("user {}", id)),
        )))
    }
}

/// Resolves the requester's rights on a project. A missing project has none.
pub async fn project_permissions(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Permissions> {
    Ok(load_project_access(pool, actor, project_id)
        .await?
        .map_or_else(permissions::evaluate_missing, |access| {
            permissions::evaluate(&access, actor)
        }))
}

pub async fn authorize_project(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    needed: Access,
) -> Result<ProjectAccess> {
    let access = load_project_access(pool, actor, project_id).await?;
    require(access, actor, needed, format_args!("project {}", project_id))
}

pub async fn authorize_node(
    pool: &PgPool,
    actor: Option<UserId>,
    node_id: NodeId,
    needed: Access,
) -> Result<ProjectAccess> {
    let access = load_node_access(pool, actor, node_id).await?;
    require(access, actor, needed, format_args!("node {}", node_id))
}

pub async fn authorize_node_type(
    pool: &PgPool,
    actor: Option<UserId>,
    type_id: NodeTypeId,
    needed: Access,
) -> Result<ProjectAccess> {
    let access = load_node_type_access(pool, actor, type_id).await?;
    require(access, actor, needed, format_args!("node type {}", type_id))
}

/// Fails with not-found unless `node_id` is a node of `project_id`.
pub(crate) async fn ensure_node_in_project(
    pool: &PgPool,
    project_id: ProjectId,
    node_id: NodeId,
) -> Result<()> {
    let exists: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM node
            WHERE id = $1
              AND project_id = $2
        )
        "#,
    )
    .bind(node_id.0)
    .bind(project_id.0)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to query node", err))?;

    if exists.0 {
        Ok(())
    } else {
        Err(LibError::not_found(
            "Node not found in project",
            anyhow!("node {} is not in project {}", node_id, project_id),
        ))
    }
}
