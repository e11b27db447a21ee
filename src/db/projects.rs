use anyhow::anyhow;
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{MemberInvite, Project, ProjectId, ProjectPayload, UserData, UserId};
use crate::permissions::{Access, Permissions};

use super::users::{UserRow, find_user};
use super::{actor_write_err, authorize_project, db_err, is_unique_violation};

#[derive(Debug, Clone, FromRow)]
struct ProjectRow {
    id: i32,
    name: String,
    description: String,
    owner_id: i32,
    public_view: bool,
    public_edit: bool,
}

impl From<ProjectRow> for Project {
    fn from(value: ProjectRow) -> Self {
        Self {
            id: ProjectId(value.id),
            name: value.name,
            description: value.description,
            owner_id: UserId(value.owner_id),
            public_view: value.public_view,
            public_edit: value.public_edit,
        }
    }
}

/// Projects the actor is a member of, owner memberships included.
pub async fn list_projects(pool: &PgPool, actor: UserId) -> Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT id, name, description, owner_id, public_view, public_edit
        FROM project
        WHERE id IN (
            SELECT project_id
            FROM users__project
            WHERE users_id = $1
        )
        ORDER BY id ASC
        "#,
    )
    .bind(actor.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list projects", err))?;

    Ok(rows.into_iter().map(Project::from).collect())
}

/// Creates a project owned by `actor` and records the owner's membership in
/// the same transaction.
pub async fn create_project(
    pool: &PgPool,
    actor: UserId,
    payload: ProjectPayload,
) -> Result<ProjectId> {
    if let Some(owner_id) = payload.owner_id.filter(|owner_id| *owner_id != actor) {
        return Err(LibError::unauthorized(
            "invalid owner id",
            anyhow!("user {} tried to create a project for {}", actor, owner_id),
        ));
    }
    let definition = payload.normalize()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    tracing::info!(name = %definition.name, owner_id = %actor, "Creating project and assigning creator to it");

    let (project_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO project (name, owner_id, description, public_view, public_edit)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(&definition.name)
    .bind(actor.0)
    .bind(&definition.description)
    .bind(definition.public_view)
    .bind(definition.public_edit)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| {
        actor_write_err("Failed to create project", actor, "project_owner_id_fkey", err)
    })?;

    sqlx::query(
        r#"
        INSERT INTO users__project (users_id, project_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(actor.0)
    .bind(project_id)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to add project owner", err))?;

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))?;

    Ok(ProjectId(project_id))
}

pub async fn get_project(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Project> {
    authorize_project(pool, actor, project_id, Access::View).await?;
    load_project(pool, project_id).await
}

async fn load_project(pool: &PgPool, project_id: ProjectId) -> Result<Project> {
    let row = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT id, name, description, owner_id, public_view, public_edit
        FROM project
        WHERE id = $1
        "#,
    )
    .bind(project_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query project", err))?;

    row.map(Project::from).ok_or_else(|| {
        LibError::no_permission(anyhow!("project {} disappeared", project_id))
    })
}

/// Replaces the editable settings of a project. The owner never changes.
pub async fn update_project(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    payload: ProjectPayload,
) -> Result<Project> {
    if let Some(body_id) = payload.id.filter(|body_id| *body_id != project_id) {
        return Err(LibError::invalid(
            "Project id does not match the request path",
            anyhow!("path project {} but body project {}", project_id, body_id),
        ));
    }
    let definition = payload.normalize()?;
    authorize_project(pool, actor, project_id, Access::Edit).await?;

    tracing::info!(%project_id, "Updating project details");

    let row = sqlx::query_as::<_, ProjectRow>(
        r#"
        UPDATE project
        SET name = $1,
            description = $2,
            public_view = $3,
            public_edit = $4
        WHERE id = $5
        RETURNING id, name, description, owner_id, public_view, public_edit
        "#,
    )
    .bind(&definition.name)
    .bind(&definition.description)
    .bind(definition.public_view)
    .bind(definition.public_edit)
    .bind(project_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to update project", err))?;

    row.map(Project::from).ok_or_else(|| {
        LibError::no_permission(anyhow!("project {} disappeared", project_id))
    })
}

/// Deletes a project and everything in it. Only the owner may do this.
pub async fn delete_project(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<()> {
    let access = authorize_project(pool, actor, project_id, Access::View).await?;
    if !access.is_owner(actor) {
        return Err(LibError::forbidden(
            "Only the project owner can delete the project",
            anyhow!("non-owner {:?} tried to delete project {}", actor, project_id),
        ));
    }

    tracing::info!(%project_id, "Deleting project");

    sqlx::query(
        r#"
        DELETE FROM project
        WHERE id = $1
        "#,
    )
    .bind(project_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to delete project", err))?;

    Ok(())
}

pub async fn get_permissions(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Permissions> {
    super::project_permissions(pool, actor, project_id).await
}

pub async fn list_members(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Vec<UserData>> {
    authorize_project(pool, actor, project_id, Access::View).await?;

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, username, email
        FROM users
        WHERE id IN (
            SELECT users_id
            FROM users__project
            WHERE project_id = $1
        )
        ORDER BY username ASC
        "#,
    )
    .bind(project_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list project members", err))?;

    Ok(rows.into_iter().map(UserData::from).collect())
}

pub async fn add_member(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    invite: MemberInvite,
) -> Result<UserData> {
    let invite = invite.normalize()?;
    authorize_project(pool, actor, project_id, Access::Edit).await?;

    let Some(user) = find_user(pool, &invite).await? else {
        return Err(LibError::not_found(
            "User not found",
            anyhow!("no user named {:?}", invite),
        ));
    };

    tracing::info!(%project_id, added_user_id = %user.id, "Adding user to project");

    sqlx::query(
        r#"
        INSERT INTO users__project (users_id, project_id)
        VALUES ($1, $2)
        "#,
    )
    .bind(user.id.0)
    .bind(project_id.0)
    .execute(pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            LibError::conflict(
                "User is already a member of this project",
                anyhow!("user {} already in project {}", user.id, project_id),
            )
        } else {
            db_err("Failed to add project member", err)
        }
    })?;

    Ok(user)
}

pub async fn remove_member(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    user_id: UserId,
) -> Result<()> {
    let access = authorize_project(pool, actor, project_id, Access::Edit).await?;
    if access.owner_id == user_id {
        return Err(LibError::forbidden(
            "Cannot delete owner",
            anyhow!("tried to remove owner {} from project {}", user_id, project_id),
        ));
    }

    tracing::info!(%project_id, removed_user_id = %user_id, "Removing user from project");

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| db_err("Failed to start transaction", err))?;

    sqlx::query(
        r#"
        DELETE FROM users__node
        WHERE users_id = $1
          AND node_id IN (
              SELECT id
              FROM node
              WHERE project_id = $2
          )
        "#,
    )
    .bind(user_id.0)
    .bind(project_id.0)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to clear node assignments", err))?;

    sqlx::query(
        r#"
        DELETE FROM users__project
        WHERE project_id = $1
          AND users_id = $2
        "#,
    )
    .bind(project_id.0)
    .bind(user_id.0)
    .execute(&mut *tx)
    .await
    .map_err(|err| db_err("Failed to remove project member", err))?;

    tx.commit()
        .await
        .map_err(|err| db_err("Failed to commit transaction", err))
}
