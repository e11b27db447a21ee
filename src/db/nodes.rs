use anyhow::anyhow;
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{Node, NodeId, NodePayload, NodeTypeId, ProjectId, UserId};
use crate::permissions::Access;

use super::node_types::ensure_type_in_project;
use super::{authorize_node, authorize_project, db_err};

#[derive(Debug, Clone, FromRow)]
struct NodeRow {
    id: i32,
    project_id: i32,
    label: String,
    status: String,
    priority: String,
    description: Option<String>,
    type_id: Option<i32>,
    x: i32,
    y: i32,
}

impl From<NodeRow> for Node {
    fn from(value: NodeRow) -> Self {
        Self {
            id: NodeId(value.id),
            project_id: ProjectId(value.project_id),
            label: value.label,
            status: value.status,
            priority: value.priority,
            description: value.description,
            type_id: value.type_id.map(NodeTypeId),
            x: value.x,
            y: value.y,
        }
    }
}

pub async fn list_nodes(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Vec<Node>> {
    authorize_project(pool, actor, project_id, Access::View).await?;

    let rows = sqlx::query_as::<_, NodeRow>(
        r#"
        SELECT id, project_id, label, status, priority, description, type_id, x, y
        FROM node
        WHERE project_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(project_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list nodes", err))?;

    Ok(rows.into_iter().map(Node::from).collect())
}

/// Inserts a node. The body is checked before anything touches the database,
/// so an incomplete node never produces a row.
pub async fn create_node(
    pool: &PgPool,
    actor: Option<UserId>,
    payload: NodePayload,
) -> Result<NodeId> {
    let node = payload.normalize_new()?;
    authorize_project(pool, actor, node.project_id, Access::Edit).await?;
    if let Some(type_id) = node.type_id {
        ensure_type_in_project(pool, node.project_id, type_id).await?;
    }

    let (node_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO node (label, status, priority, project_id, x, y, description, type_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&node.label)
    .bind(&node.status)
    .bind(&node.priority)
    .bind(node.project_id.0)
    .bind(node.x)
    .bind(node.y)
    .bind(&node.description)
    .bind(node.type_id.map(|id| id.0))
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to create node", err))?;

    tracing::debug!(node_id, project_id = %node.project_id, "Created node");
    Ok(NodeId(node_id))
}

/// Replaces every field of a node. A node never moves between projects.
pub async fn update_node(
    pool: &PgPool,
    actor: Option<UserId>,
    payload: NodePayload,
) -> Result<Node> {
    let node = payload.normalize_update()?;
    let node_id = node
        .id
        .ok_or_else(|| LibError::message("Node update lost its id"))?;

    let access = authorize_node(pool, actor, node_id, Access::Edit).await?;
    if access.project_id != node.project_id {
        return Err(LibError::invalid(
            "Nodes cannot move between projects",
            anyhow!(
                "node {} is in project {}, body names {}",
                node_id,
                access.project_id,
                node.project_id
            ),
        ));
    }
    if let Some(type_id) = node.type_id {
        ensure_type_in_project(pool, node.project_id, type_id).await?;
    }

    let row = sqlx::query_as::<_, NodeRow>(
        r#"
        UPDATE node
        SET label = $1,
            status = $2,
            priority = $3,
            x = $4,
            y = $5,
            description = $6,
            type_id = $7
        WHERE id = $8
        RETURNING id, project_id, label, status, priority, description, type_id, x, y
        "#,
    )
    .bind(&node.label)
    .bind(&node.status)
    .bind(&node.priority)
    .bind(node.x)
    .bind(node.y)
    .bind(&node.description)
    .bind(node.type_id.map(|id| id.0))
    .bind(node_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to update node", err))?;

    row.map(Node::from).ok_or_else(|| {
        LibError::no_permission(anyhow!("node {} disappeared", node_id))
    })
}

/// Deletes a node with its edges, comments and assignments.
pub async fn delete_node(pool: &PgPool, actor: Option<UserId>, node_id: NodeId) -> Result<()> {
    authorize_node(pool, actor, node_id, Access::Edit).await?;

    tracing::debug!(%node_id, "Deleting node");

    sqlx::query(
        r#"
        DELETE FROM node
        WHERE id = $1
        "#,
    )
    .bind(node_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to delete node", err))?;

    Ok(())
}
