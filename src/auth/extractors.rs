use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts, response::Response};

use super::{guard::redirect_to_login, repo_types::User};

/// The user behind the session cookie, as resolved by the route guard.
/// Only present on protected paths; elsewhere the extractor redirects.
pub struct SessionUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(redirect_to_login)
    }
}
