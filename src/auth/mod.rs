use crate::state::AppState;
use axum::Router;

pub mod actions;
pub mod dto;
pub mod errors;
pub(crate) mod extractors;
pub mod guard;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::action_routes())
}
