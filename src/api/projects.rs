use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
};

use crate::db;
use crate::error::LibError;
use crate::models::{Created, MemberInvite, ProjectId, ProjectPayload, UserId};

use super::{AppError, AuthenticatedUser, BoardApp, MaybeUser, Payload};

async fn list_projects_handler<S>(
    State(app): State<S>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let projects = db::projects::list_projects(&app.pool(), auth_user.id()).await?;
    Ok(Json(projects))
}

async fn create_project_handler<S>(
    State(app): State<S>,
    auth_user: AuthenticatedUser,
    Payload(payload): Payload<ProjectPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let id = db::projects::create_project(&app.pool(), auth_user.id(), payload).await?;
    Ok(Json(Created { id }))
}

async fn get_project_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let project = db::projects::get_project(&app.pool(), user.id(), project_id).await?;
    Ok(Json(project))
}

async fn update_project_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
    Payload(payload): Payload<ProjectPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let project =
        db::projects::update_project(&app.pool(), user.id(), project_id, payload).await?;
    Ok(Json(project))
}

/// `PUT /project` with the project id in the body.
async fn update_project_from_body_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Payload(payload): Payload<ProjectPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let Some(project_id) = payload.id else {
        return Err(LibError::invalid(
            "Project id is required",
            anyhow!("project update without id"),
        )
        .into());
    };
    let project =
        db::projects::update_project(&app.pool(), user.id(), project_id, payload).await?;
    Ok(Json(project))
}

async fn delete_project_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::projects::delete_project(&app.pool(), user.id(), project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn permission_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let permissions = db::projects::get_permissions(&app.pool(), user.id(), project_id).await?;
    Ok(Json(permissions))
}

async fn list_members_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let members = db::projects::list_members(&app.pool(), user.id(), project_id).await?;
    Ok(Json(members))
}

async fn add_member_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path(project_id): Path<ProjectId>,
    Payload(invite): Payload<MemberInvite>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let member = db::projects::add_member(&app.pool(), user.id(), project_id, invite).await?;
    Ok(Json(member))
}

async fn remove_member_handler<S>(
    State(app): State<S>,
    user: MaybeUser,
    Path((project_id, user_id)): Path<(ProjectId, UserId)>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    db::projects::remove_member(&app.pool(), user.id(), project_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /project [GET,POST,PUT]");
    tracing::info!("Registering route /project/{{project_id}} [GET,PUT,DELETE]");
    tracing::info!("Registering route /project/{{project_id}}/permission [GET]");
    tracing::info!("Registering route /project/{{project_id}}/members [GET,POST]");
    tracing::info!("Registering route /project/{{project_id}}/members/{{user_id}} [DELETE]");

    Router::new()
        .route(
            "/project",
            get(list_projects_handler::<S>)
                .post(create_project_handler::<S>)
                .put(update_project_from_body_handler::<S>),
        )
        .route(
            "/project/{project_id}",
            get(get_project_handler::<S>)
                .put(update_project_handler::<S>)
                .delete(delete_project_handler::<S>),
        )
        .route(
            "/project/{project_id}/permission",
            get(permission_handler::<S>),
        )
        .route(
            "/project/{project_id}/members",
            get(list_members_handler::<S>).post(add_member_handler::<S>),
        )
        .route(
            "/project/{project_id}/members/{user_id}",
            delete(remove_member_handler::<S>),
        )
}
