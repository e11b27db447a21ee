use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

use crate::db;
use crate::models::{Created, NodeTypeId, NodeTypePayload, ProjectId};

use super::{AppError, BoardApp, MaybeUser, Payload};

async fn list_node_types_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let types = db::node_types::list_node_types(&app.pool(), user.id(), project_id).await?;
    Ok(Json(types))
}

async fn create_node_type_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
    Payload(payload): Payload<NodeTypePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let id =
        db::node_types::create_node_type(&app.pool(), user.id(), project_id, payload).await?;
    Ok(Json(Created { id }))
}

async fn update_node_type_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((project_id, type_id)): Path<(ProjectId, NodeTypeId)>,
    Payload(payload): Payload<NodeTypePayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let node_type =
        db::node_types::update_node_type(&app.pool(), user.id(), project_id, type_id, payload)
            .await?;
    Ok(Json(node_type))
}

async fn delete_node_type_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((project_id, type_id)): Path<(ProjectId, NodeTypeId)>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::node_types::delete_node_type(&app.pool(), user.id(), project_id, type_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /project/{{project_id}}/type [GET,POST]");
    tracing::info!("Registering route /project/{{project_id}}/type/{{type_id}} [PUT,DELETE]");

    Router::new()
        .route(
            "/project/{project_id}/type",
            get(list_node_types_handler::<S>).post(create_node_type_handler::<S>),
        )
        .route(
            "/project/{project_id}/type/{type_id}",
            put(update_node_type_handler::<S>).delete(delete_node_type_handler::<S>),
        )
}
