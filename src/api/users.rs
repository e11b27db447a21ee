use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};

use crate::auth;
use crate::db;
use crate::error::LibError;
use crate::models::{LoginPayload, RegistrationPayload, UserToken};

use super::{AppError, AuthenticatedUser, BoardApp, Payload};

async fn register_handler<S>(
    State(app): State<S>,
    Payload(payload): Payload<RegistrationPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let user = db::users::register_user(&app.pool(), payload).await?;
    Ok(Json(user))
}

async fn login_handler<S>(
    State(app): State<S>,
    Payload(payload): Payload<LoginPayload>,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let user = db::users::authenticate(&app.pool(), payload).await?;
    let token = auth::encode_token(&user, app.auth_config())
        .map_err(|err| LibError::unknown("Failed to issue token", err))?;
    Ok(Json(UserToken {
        token,
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

async fn whoami_handler<S>(
    State(app): State<S>,
    auth_user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    let user = db::users::get_user(&app.pool(), auth_user.id()).await?;
    Ok(Json(user))
}

pub(super) fn routes<S>() -> Router<S>
where
    S: BoardApp + Clone + Send + Sync + 'static,
{
    tracing::info!("Registering route /user/register [POST]");
    tracing::info!("Registering route /user/login [POST]");
    tracing::info!("Registering route /user/me [GET]");

    Router::new()
        .route("/user/register", post(register_handler::<S>))
        .route("/user/login", post(login_handler::<S>))
        .route("/user/me", get(whoami_handler::<S>))
}
