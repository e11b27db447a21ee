use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use crate::db;
use crate::models::{AssignmentPayload, NodeId, UserId};

use super::{AppError, BoardApp, MaybeUser, Payload};

async fn list_assigned_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(node_id): Path<NodeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let users = db::assignments::list_assigned_users(&app.pool(), user.id(), node_id).await?;
    Ok(Json(users))
}

async fn assign_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(node_id): Path<NodeId>,
    Payload(payload): Payload<AssignmentPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let assigned = db::assignments::assign_user(&app.pool(), user.id(), node_id, payload).await?;
    Ok(Json(assigned))
}

async fn unassign_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((node_id, user_id)): Path<(NodeId, UserId)>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::assignments::unassign_user(&app.pool(), user.id(), node_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /assignment/{{node_id}} [GET,POST]");
    tracing::info!("Registering route /assignment/{{node_id}}/{{user_id}} [DELETE]");

    Router::new()
        .route(
            "/assignment/{node_id}",
            get(list_assigned_handler::<S>).post(assign_handler::<S>),
        )
        .route(
            "/assignment/{node_id}/{user_id}",
            delete(unassign_handler::<S>),
        )
}
