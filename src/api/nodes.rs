use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::db;
use crate::models::{Created, NodeId, NodePayload, ProjectId};

use super::{AppError, BoardApp, MaybeUser, Payload};

async fn list_nodes_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let nodes = db::nodes::list_nodes(&app.pool(), user.id(), project_id).await?;
    Ok(Json(nodes))
}

async fn create_node_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Payload(payload): Payload<NodePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let id = db::nodes::create_node(&app.pool(), user.id(), payload).await?;
    Ok(Json(Created { id }))
}

async fn update_node_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Payload(payload): Payload<NodePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let node = db::nodes::update_node(&app.pool(), user.id(), payload).await?;
    Ok(Json(node))
}

async fn delete_node_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(node_id): Path<NodeId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::nodes::delete_node(&app.pool(), user.id(), node_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /node [POST,PUT]");
    tracing::info!("Registering route /node/{{id}} [GET,DELETE]");

    // GET takes a project id, DELETE a node id.
    Router::new()
        .route(
            "/node",
            post(create_node_handler::<S>).put(update_node_handler::<S>),
        )
        .route(
            "/node/{id}",
            get(list_nodes_handler::<S>).delete(delete_node_handler::<S>),
        )
}
