use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};

use crate::db;
use crate::models::{CommentPayload, NodeId, ProjectId};

use super::{AppError, AuthenticatedUser, BoardApp, MaybeUser, Payload};

async fn list_comments_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((project_id, node_id)): Path<(ProjectId, NodeId)>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let comments =
        db::comments::list_comments(&app.pool(), user.id(), project_id, node_id).await?;
    Ok(Json(comments))
}

async fn add_comment_handler<S>(
    State(app): State<S>,
    auth_user: AuthenticatedUser,
    Path((project_id, node_id)): Path<(ProjectId, NodeId)>,
    Payload(payload): Payload<CommentPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::debug!(%node_id, username = auth_user.username(), "Adding comment");
    let comment =
        db::comments::add_comment(&app.pool(), auth_user.id(), project_id, node_id, payload)
            .await?;
    Ok(Json(comment))
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /project/{{project_id}}/node/{{node_id}}/comment [GET,POST]");

    Router::new().route(
        "/project/{project_id}/node/{node_id}/comment",
        get(list_comments_handler::<S>).post(add_comment_handler::<S>),
    )
}
