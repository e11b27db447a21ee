use anyhow::anyhow;
use sqlx::{FromRow, PgPool};

use crate::error::{LibError, Result};
use crate::models::{Edge, EdgePayload, NodeId, ProjectId, UserId};
use crate::permissions::Access;

use super::{authorize_node, authorize_project, db_err};

#[derive(Debug, Clone, FromRow)]
struct EdgeRow {
    source_id: i32,
    target_id: i32,
    project_id: i32,
}

impl From<EdgeRow> for Edge {
    fn from(value: EdgeRow) -> Self {
        Self {
            source_id: NodeId(value.source_id),
            target_id: NodeId(value.target_id),
            project_id: ProjectId(value.project_id),
        }
    }
}

pub async fn list_edges(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
) -> Result<Vec<Edge>> {
    authorize_project(pool, actor, project_id, Access::View).await?;

    let rows = sqlx::query_as::<_, EdgeRow>(
        r#"
        SELECT source_id, target_id, project_id
        FROM edge
        WHERE project_id = $1
        ORDER BY source_id ASC, target_id ASC
        "#,
    )
    .bind(project_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list edges", err))?;

    Ok(rows.into_iter().map(Edge::from).collect())
}

/// Connects two nodes of the same project. Adding an existing edge again is
/// a no-op.
pub async fn create_edge(
    pool: &PgPool,
    actor: Option<UserId>,
    payload: EdgePayload,
) -> Result<Edge> {
    let edge = payload.normalize()?;
    authorize_project(pool, actor, edge.project_id, Access::Edit).await?;

    let (endpoints_in_project,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(DISTINCT id)
        FROM node
        WHERE project_id = $1
          AND id IN ($2, $3)
        "#,
    )
    .bind(edge.project_id.0)
    .bind(edge.source_id.0)
    .bind(edge.target_id.0)
    .fetch_one(pool)
    .await
    .map_err(|err| db_err("Failed to query edge endpoints", err))?;

    let expected = if edge.source_id == edge.target_id { 1 } else { 2 };
    if endpoints_in_project != expected {
        return Err(LibError::invalid(
            "Edge endpoints must be nodes of the project",
            anyhow!(
                "edge {} -> {} does not lie within project {}",
                edge.source_id,
                edge.target_id,
                edge.project_id
            ),
        ));
    }

    sqlx::query(
        r#"
        INSERT INTO edge (source_id, target_id, project_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (source_id, target_id) DO NOTHING
        "#,
    )
    .bind(edge.source_id.0)
    .bind(edge.target_id.0)
    .bind(edge.project_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to create edge", err))?;

    Ok(edge)
}

/// Removes the edge `source -> target`, authorized through the source node.
pub async fn delete_edge(
    pool: &PgPool,
    actor: Option<UserId>,
    source_id: NodeId,
    target_id: NodeId,
) -> Result<()> {
    authorize_node(pool, actor, source_id, Access::Edit).await?;

    let deleted = sqlx::query(
        r#"
        DELETE FROM edge
        WHERE source_id = $1
          AND target_id = $2
        "#,
    )
    .bind(source_id.0)
    .bind(target_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to delete edge", err))?;

    if deleted.rows_affected() == 0 {
        return Err(LibError::not_found(
            "Edge not found",
            anyhow!("no edge {} -> {}", source_id, target_id),
        ));
    }

    Ok(())
}
