use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::{
    auth::{
        repo::UserStore,
        repo_types::User,
        session::{parse_session_id, RequestContext},
    },
    state::AppState,
};

pub const PROTECTED_PREFIX: &str = "/dashboard";
pub const LOGIN_PATH: &str = "/auth/login";

#[derive(Debug)]
pub enum GuardDecision {
    /// Path is public; no session lookup was made.
    Public,
    /// Protected path with a valid session.
    Authenticated(User),
    RedirectToLogin,
}

pub fn is_protected(path: &str) -> bool {
    path.starts_with(PROTECTED_PREFIX)
}

/// Decides access for one request. Never fails: any problem validating the
/// session clears the cookie and sends the visitor to the login page.
pub async fn check_access(store: &dyn UserStore, ctx: &mut RequestContext) -> GuardDecision {
    if !is_protected(&ctx.path) {
        return GuardDecision::Public;
    }

    let Some(raw) = ctx.session_value().map(str::to_owned) else {
        debug!(path = %ctx.path, "no session cookie");
        return GuardDecision::RedirectToLogin;
    };

    let Some(user_id) = parse_session_id(&raw) else {
        warn!(value = %raw, "malformed session cookie");
        ctx.end_session();
        return GuardDecision::RedirectToLogin;
    };

    match store.find_by_id(user_id).await {
        Ok(Some(user)) => GuardDecision::Authenticated(user),
        Ok(None) => {
            warn!(user_id, "session for unknown user");
            ctx.end_session();
            GuardDecision::RedirectToLogin
        }
        Err(e) => {
            warn!(error = %e, user_id, "session lookup failed");
            ctx.end_session();
            GuardDecision::RedirectToLogin
        }
    }
}

pub fn redirect_to_login() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)]).into_response()
}

/// Middleware run on every request before routing reaches a page or action.
/// On protected paths the resolved `User` is stored in the request extensions.
pub async fn route_guard(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut ctx = RequestContext::new(req.uri().path(), req.headers());
    match check_access(state.users.as_ref(), &mut ctx).await {
        GuardDecision::Public => next.run(req).await,
        GuardDecision::Authenticated(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        GuardDecision::RedirectToLogin => {
            let mut res = redirect_to_login();
            ctx.write_cookies(res.headers_mut());
            res
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        repo::MemoryUserStore,
        repo_types::{NewUser, User},
        session::SESSION_COOKIE,
    };
    use async_trait::async_trait;
    use axum::http::{HeaderMap, HeaderValue};

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
            anyhow::bail!("db down")
        }
        async fn find_by_id(&self, _id: i64) -> anyhow::Result<Option<User>> {
            anyhow::bail!("db down")
        }
        async fn create(&self, _new_user: NewUser<'_>) -> anyhow::Result<User> {
            anyhow::bail!("db down")
        }
    }

    fn ctx(path: &str, session: Option<&str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(v) = session {
            headers.insert(
                header::COOKIE,
                HeaderValue::from_str(&format!("{SESSION_COOKIE}={v}")).unwrap(),
            );
        }
        RequestContext::new(path, &headers)
    }

    fn redirected(decision: &GuardDecision) -> bool {
        matches!(decision, GuardDecision::RedirectToLogin)
    }

    fn cleared(ctx: &RequestContext) -> bool {
        ctx.cookies
            .delta()
            .any(|c| c.name() == SESSION_COOKIE && c.value().is_empty())
    }

    async fn store_with_one_user() -> MemoryUserStore {
        let store = MemoryUserStore::new();
        store
            .create(NewUser {
                name: "Ana",
                email: "ana@example.com",
                password_hash: "x",
            })
            .await
            .unwrap();
        store
    }

    #[test]
    fn protected_prefix() {
        assert!(is_protected("/dashboard"));
        assert!(is_protected("/dashboard/services"));
        assert!(!is_protected("/"));
        assert!(!is_protected("/auth/login"));
        assert!(!is_protected("/_actions/login"));
    }

    #[tokio::test]
    async fn unprotected_paths_always_proceed() {
        let store = MemoryUserStore::new();
        for session in [None, Some("abc"), Some("999")] {
            let mut c = ctx("/auth/login", session);
            assert!(matches!(check_access(&store, &mut c).await, GuardDecision::Public));
            assert!(!cleared(&c));
        }
        let mut c = ctx("/", Some("1"));
        assert!(matches!(check_access(&BrokenStore, &mut c).await, GuardDecision::Public));
    }

    #[tokio::test]
    async fn protected_without_cookie_redirects() {
        let store = store_with_one_user().await;
        let mut c = ctx("/dashboard", None);
        assert!(redirected(&check_access(&store, &mut c).await));
        assert!(!cleared(&c));
    }

    #[tokio::test]
    async fn protected_with_valid_session_proceeds() {
        let store = store_with_one_user().await;
        let mut c = ctx("/dashboard/services", Some("1"));
        match check_access(&store, &mut c).await {
            GuardDecision::Authenticated(user) => assert_eq!(user.email, "ana@example.com"),
            other => panic!("expected authenticated, got {other:?}"),
        }
        assert_eq!(c.cookies.delta().count(), 0);
    }

    #[tokio::test]
    async fn unknown_user_redirects_and_clears_cookie() {
        let store = store_with_one_user().await;
        let mut c = ctx("/dashboard", Some("42"));
        assert!(redirected(&check_access(&store, &mut c).await));
        assert!(cleared(&c));
    }

    #[tokio::test]
    async fn deleted_user_is_locked_out() {
        let store = store_with_one_user().await;
        store.remove(1).await.expect("removed");
        let mut c = ctx("/dashboard", Some("1"));
        assert!(redirected(&check_access(&store, &mut c).await));
        assert!(cleared(&c));
    }

    #[tokio::test]
    async fn malformed_cookie_redirects_and_clears_cookie() {
        let store = store_with_one_user().await;
        let mut c = ctx("/dashboard", Some("not-a-number"));
        assert!(redirected(&check_access(&store, &mut c).await));
        assert!(cleared(&c));
    }

    #[tokio::test]
    async fn leading_integer_in_cookie_is_accepted() {
        let store = store_with_one_user().await;
        let mut c = ctx("/dashboard", Some("1abc"));
        assert!(matches!(
            check_access(&store, &mut c).await,
            GuardDecision::Authenticated(ref u) if u.id == 1
        ));
        assert!(!cleared(&c));

        let mut c = ctx("/dashboard", Some("abc"));
        assert!(redirected(&check_access(&store, &mut c).await));
        assert!(cleared(&c));
    }

    #[tokio::test]
    async fn lookup_failure_fails_closed() {
        let mut c = ctx("/dashboard", Some("1"));
        assert!(redirected(&check_access(&BrokenStore, &mut c).await));
        assert!(cleared(&c));
    }

    #[test]
    fn redirect_response_points_at_login() {
        let res = redirect_to_login();
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], LOGIN_PATH);
    }
}
