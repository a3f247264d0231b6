use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::{
        actions,
        dto::{ActionOutput, LoginRequest, RegisterRequest},
        errors::{ApiError, InputError, InputIssue},
        session::RequestContext,
    },
    state::AppState,
};

/// RPC-style action endpoints.
pub fn action_routes() -> Router<AppState> {
    Router::new()
        .route("/_actions/login", post(login))
        .route("/_actions/logout", post(logout))
        .route("/_actions/register", post(register))
}

fn reply(ctx: &RequestContext, result: Result<ActionOutput, ApiError>) -> Response {
    let mut res = match result {
        Ok(out) => Json(out).into_response(),
        Err(e) => e.into_response(),
    };
    ctx.write_cookies(res.headers_mut());
    res
}

/// Unreadable bodies are reported as a validation failure; the decoder's
/// own message stays in the log.
fn read_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, InputError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        debug!(error = %rejection, "unreadable action body");
        InputError::from(vec![InputIssue::new(
            "body",
            "Cuerpo de la solicitud inválido",
        )])
    })
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let input = read_body(payload).and_then(|req| req.validate().map_err(InputError::from));
    let result = match input {
        Ok(input) => actions::login(state.users.as_ref(), &mut ctx, input)
            .await
            .map_err(ApiError::from),
        Err(e) => Err(e.into()),
    };
    reply(&ctx, result)
}

#[instrument(skip_all)]
pub async fn logout(mut ctx: RequestContext) -> Response {
    let result = actions::logout(&mut ctx).await.map_err(ApiError::from);
    reply(&ctx, result)
}

#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    mut ctx: RequestContext,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Response {
    let input = read_body(payload).and_then(|req| req.validate().map_err(InputError::from));
    let result = match input {
        Ok(input) => actions::register(state.users.as_ref(), &mut ctx, input)
            .await
            .map_err(ApiError::from),
        Err(e) => Err(e.into()),
    };
    reply(&ctx, result)
}
