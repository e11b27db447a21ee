use sqlx::{FromRow, PgPool};

use crate::error::Result;
use crate::models::{Comment, CommentId, CommentPayload, NodeId, ProjectId, UserId};
use crate::permissions::Access;

use super::{actor_write_err, authorize_project, db_err, ensure_node_in_project};

#[derive(Debug, Clone, FromRow)]
struct CommentRow {
    id: i32,
    node_id: i32,
    users_id: i32,
    username: String,
    content: String,
    created: chrono::NaiveDateTime,
}

impl From<CommentRow> for Comment {
    fn from(value: CommentRow) -> Self {
        Self {
            id: CommentId(value.id),
            node_id: NodeId(value.node_id),
            users_id: UserId(value.users_id),
            username: value.username,
            content: value.content,
            created: value.created,
        }
    }
}

/// Comments on a node, oldest first.
pub async fn list_comments(
    pool: &PgPool,
    actor: Option<UserId>,
    project_id: ProjectId,
    node_id: NodeId,
) -> Result<Vec<Comment>> {
    authorize_project(pool, actor, project_id, Access::View).await?;
    ensure_node_in_project(pool, project_id, node_id).await?;

    let rows = sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT c.id, c.node_id, c.users_id, u.username, c.content, c.created
        FROM comment c
        JOIN users u
        ON u.id = c.users_id
        WHERE c.node_id = $1
        ORDER BY c.created ASC, c.id ASC
        "#,
    )
    .bind(node_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list comments", err))?;

    Ok(rows.into_iter().map(Comment::from).collect())
}

pub async fn add_comment(
    pool: &PgPool,
    actor: UserId,
    project_id: ProjectId,
    node_id: NodeId,
    payload: CommentPayload,
) -> Result<Comment> {
    let content = payload.normalize()?;
    authorize_project(pool, Some(actor), project_id, Access::Edit).await?;
    ensure_node_in_project(pool, project_id, node_id).await?;

    let row = sqlx::query_as::<_, CommentRow>(
        r#"
        WITH inserted AS (
            INSERT INTO comment (node_id, users_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, node_id, users_id, content, created
        )
        SELECT i.id, i.node_id, i.users_id, u.username, i.content, i.created
        FROM inserted i
        JOIN users u
        ON u.id = i.users_id
        "#,
    )
    .bind(node_id.0)
    .bind(actor.0)
    .bind(&content)
    .fetch_one(pool)
    .await
    .map_err(|err| {
        actor_write_err("Failed to create comment", actor, "comment_users_id_fkey", err)
    })?;

    Ok(row.into())
}
