use anyhow::anyhow;
use sqlx::PgPool;

use crate::error::{LibError, Result};
use crate::models::{AssignmentPayload, NodeId, UserData, UserId};
use crate::permissions::Access;

use super::users::UserRow;
use super::{authorize_node, db_err};

pub async fn list_assigned_users(
    pool: &PgPool,
    actor: Option<UserId>,
    node_id: NodeId,
) -> Result<Vec<UserData>> {
    authorize_node(pool, actor, node_id, Access::View).await?;

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.username, u.email
        FROM users__node un
        JOIN users u
        ON u.id = un.users_id
        WHERE un.node_id = $1
        ORDER BY u.username ASC
        "#,
    )
    .bind(node_id.0)
    .fetch_all(pool)
    .await
    .map_err(|err| db_err("Failed to list assigned users", err))?;

    Ok(rows.into_iter().map(UserData::from).collect())
}

/// Assigns a project member to a node. Assigning twice is a no-op.
pub async fn assign_user(
    pool: &PgPool,
    actor: Option<UserId>,
    node_id: NodeId,
    payload: AssignmentPayload,
) -> Result<UserData> {
    let Some(user_id) = payload.user_id else {
        return Err(LibError::invalid(
            "user_id is required",
            anyhow!("assignment without user_id"),
        ));
    };
    let access = authorize_node(pool, actor, node_id, Access::Edit).await?;

    let member = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.username, u.email
        FROM users u
        JOIN users__project up
        ON up.users_id = u.id
        WHERE u.id = $1
          AND up.project_id = $2
        "#,
    )
    .bind(user_id.0)
    .bind(access.project_id.0)
    .fetch_optional(pool)
    .await
    .map_err(|err| db_err("Failed to query project member", err))?;

    let Some(member) = member else {
        return Err(LibError::invalid(
            "Only project members can be assigned",
            anyhow!(
                "user {} is not a member of project {}",
                user_id,
                access.project_id
            ),
        ));
    };

    sqlx::query(
        r#"
        INSERT INTO users__node (users_id, node_id)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id.0)
    .bind(node_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to assign user", err))?;

    tracing::info!(%node_id, assigned_user_id = %user_id, "Assigned user to node");
    Ok(member.into())
}

pub async fn unassign_user(
    pool: &PgPool,
    actor: Option<UserId>,
    node_id: NodeId,
    user_id: UserId,
) -> Result<()> {
    authorize_node(pool, actor, node_id, Access::Edit).await?;

    sqlx::query(
        r#"
        DELETE FROM users__node
        WHERE node_id = $1
          AND users_id = $2
        "#,
    )
    .bind(node_id.0)
    .bind(user_id.0)
    .execute(pool)
    .await
    .map_err(|err| db_err("Failed to unassign user", err))?;

    Ok(())
}
