use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use crate::db;
use crate::models::{EdgePayload, NodeId, ProjectId};

use super::{AppError, BoardApp, MaybeUser, Payload};

async fn list_edges_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let edges = db::edges::list_edges(&app.pool(), user.id(), project_id).await?;
    Ok(Json(edges))
}

async fn create_edge_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Payload(payload): Payload<EdgePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let edge = db::edges::create_edge(&app.pool(), user.id(), payload).await?;
    Ok(Json(edge))
}

async fn delete_edge_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((source_id, target_id)): Path<(NodeId, NodeId)>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::edges::delete_edge(&app.pool(), user.id(), source_id, target_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /edge [POST]");
    tracing::info!("Registering route /edge/{{id}} [GET]");
    tracing::info!("Registering route /edge/{{id}}/{{target_id}} [DELETE]");

    // `{id}` is a project id on GET and the source node id on DELETE.
    Router::new()
        .route("/edge", post(create_edge_handler::<S>))
        .route("/edge/{id}", get(list_edges_handler::<S>))
        .route("/edge/{id}/{target_id}", delete(delete_edge_handler::<S>))
}
