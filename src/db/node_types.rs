use anyhow::anyhow;
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{NodeType, NodeTypeId, NodeTypePayload, ProjectId, UserId};
use crate::permissions::Access;

use super::{authorize_node_type, authorize_project, db_err};

#[derive(Debug, Clone, FromRow)]
struct NodeTypeRow {
    id: i32,
    label: String,
    color: String,
}

impl From<NodeTypeRow> for NodeType {
    fn from(value: NodeTypeRow) -> Self {
        Self {
            id: NodeTypeId(value.id),
            label: value.label,
            color: value.color,
        }
    }
}

pub async fn list_node_types(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Vec<NodeType>> {
    authorize_project(pool, actor, project_id, Access::View).await?;

    let rows = sqlx::query_as::<_, NodeTypeRow>(
        r#"
        SELECT id, label, color
        FROM node_type
        WHERE project_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(project_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list node types", err))?;

    Ok(rows.into_iter().map(NodeType::from).collect())
}

pub async fn create_node_type(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    payload: NodeTypePayload,
) -> Result<NodeTypeId> {
    let payload = payload.normalize()?;
    authorize_project(pool, actor, project_id, Access::Edit).await?;

    let (type_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO node_type (project_id, label, color)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(project_id.0)
    .bind(&payload.label)
    .bind(&payload.color)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to create node type", err))?;

    Ok(NodeTypeId(type_id))
}

/// Authorizes through the type's own project and rejects a type that is not
/// part of `project_id`.
async fn authorize_type_in_project(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    type_id: NodeTypeId,
) -> Result<()> {
    let access = authorize_node_type(pool, actor, type_id, Access::Edit).await?;
    if access.project_id != project_id {
        return Err(LibError::not_found(
            "Node type not found in project",
            anyhow!(
                "node type {} belongs to project {}, not {}",
                type_id,
                access.project_id,
                project_id
            ),
        ));
    }
    Ok(())
}

pub async fn update_node_type(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    type_id: NodeTypeId,
    payload: NodeTypePayload,
) -> Result<NodeType> {
    let payload = payload.normalize()?;
    authorize_type_in_project(pool, actor, project_id, type_id).await?;

    let row = sqlx::query_as::<_, NodeTypeRow>(
        r#"
        UPDATE node_type
        SET label = $1,
            color = $2
        WHERE id = $3
        RETURNING id, label, color
        "#,
    )
    .bind(&payload.label)
    .bind(&payload.color)
    .bind(type_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to update node type", err))?;

    row.map(NodeType::from).ok_or_else(|| {
        LibError::not_found(
            "Node type not found in project",
            anyhow!("node type {} disappeared", type_id),
        )
    })
}

/// Deletes a node type. Nodes of that type keep existing without a type.
pub async fn delete_node_type(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    type_id: NodeTypeId,
) -> Result<()> {
    authorize_type_in_project(pool, actor, project_id, type_id).await?;

    sqlx::query(
        r#"
        DELETE FROM node_type
        WHERE id = $1
        "#,
    )
    .bind(type_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to delete node type", err))?;

    Ok(())
}

/// Fails with invalid input unless `type_id` is a type of `project_id`.
pub(crate) async fn ensure_type_in_project(
    pool: &PgPool,
    project_id: ProjectId,
    type_id: NodeTypeId,
) -> Result<()> {
    let exists: (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1
            FROM node_type
            WHERE id = $1
              AND project_id = $2
        )
        "#,
    )
    .bind(type_id.0)
    .bind(project_id.0)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to query node type", err))?;

    if exists.0 {
        Ok(())
    } else {
        Err(LibError::invalid(
            "Node type does not belong to this project",
            anyhow!("node type {} is not in project {}", type_id, project_id),
        ))
    }
}
