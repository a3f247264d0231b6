//! Login, logout and registration over an explicit store and request context.

use tracing::{info, instrument, warn};

use crate::auth::{
    dto::{ActionOutput, LoginInput, PublicUser, RegisterInput},
    errors::{internal, ActionError},
    password::{hash_password_async, verify_password_async},
    repo::UserStore,
    repo_types::NewUser,
    session::RequestContext,
};

const LOGIN_FAILED: &str = "Error interno del servidor";
const REGISTER_FAILED: &str = "Error interno del servidor al crear la cuenta";

#[instrument(skip(store, ctx, input), fields(email = %input.email))]
pub async fn login(
    store: &dyn UserStore,
    ctx: &mut RequestContext,
    input: LoginInput,
) -> Result<ActionOutput, ActionError> {
    let user = store
        .find_by_email(&input.email)
        .await
        .map_err(internal(LOGIN_FAILED))?
        .ok_or_else(|| {
            warn!("login unknown email");
            ActionError::Unauthorized("Usuario no encontrado".into())
        })?;

    let ok = verify_password_async(input.password, user.password_hash.clone())
        .await
        .map_err(internal(LOGIN_FAILED))?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ActionError::Unauthorized("Contraseña incorrecta".into()));
    }

    ctx.start_session(user.id);

    info!(user_id = user.id, "user logged in");
    Ok(ActionOutput {
        success: true,
        message: format!("¡Bienvenido {}!", user.name),
        user: Some(PublicUser::from(&user)),
    })
}

#[instrument(skip(ctx))]
pub async fn logout(ctx: &mut RequestContext) -> Result<ActionOutput, ActionError> {
    ctx.end_session();
    Ok(ActionOutput {
        success: true,
        message: "Has cerrado sesión exitosamente".into(),
        user: None,
    })
}

#[instrument(skip(store, ctx, input), fields(email = %input.email))]
pub async fn register(
    store: &dyn UserStore,
    ctx: &mut RequestContext,
    input: RegisterInput,
) -> Result<ActionOutput, ActionError> {
    let existing = store
        .find_by_email(&input.email)
        .await
        .map_err(internal(REGISTER_FAILED))?;
    if existing.is_some() {
        warn!("email already registered");
        return Err(ActionError::Conflict(
            "Ya existe un usuario con este email".into(),
        ));
    }

    let hash = hash_password_async(input.password)
        .await
        .map_err(internal(REGISTER_FAILED))?;

    let user = store
        .create(NewUser {
            name: &input.name,
            email: &input.email,
            password_hash: &hash,
        })
        .await
        .map_err(internal(REGISTER_FAILED))?;

    ctx.start_session(user.id);

    info!(user_id = user.id, "user registered");
    Ok(ActionOutput {
        success: true,
        message: format!(
            "¡Bienvenido {}! Tu cuenta ha sido creada exitosamente.",
            user.name
        ),
        user: Some(PublicUser::from(&user)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        password::hash_password, repo::MemoryUserStore, repo_types::User,
        session::SESSION_COOKIE,
    };
    use async_trait::async_trait;

    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_by_email(&self, _email: &str) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection reset by peer")
        }
        async fn find_by_id(&self, _id: i64) -> anyhow::Result<Option<User>> {
            anyhow::bail!("connection reset by peer")
        }
        async fn create(&self, _new_user: NewUser<'_>) -> anyhow::Result<User> {
            anyhow::bail!("connection reset by peer")
        }
    }

    async fn store_with(name: &str, email: &str, password: &str) -> (MemoryUserStore, i64) {
        let store = MemoryUserStore::new();
        let hash = hash_password(password).unwrap();
        let user = store
            .create(NewUser {
                name,
                email,
                password_hash: &hash,
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.into(),
            password: password.into(),
        }
    }

    fn register_input(name: &str, email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn issued_session(ctx: &RequestContext) -> Option<String> {
        ctx.cookies.delta().find(|c| c.name() == SESSION_COOKIE).map(|c| c.value().to_string())
    }

    #[tokio::test]
    async fn login_with_correct_password_sets_session_to_user_id() {
        let (store, id) = store_with("Administrador", "admin@ejemplo.com", "password123").await;
        let mut ctx = RequestContext::default();

        let out = login(&store, &mut ctx, login_input("admin@ejemplo.com", "password123"))
            .await
            .expect("login");

        assert!(out.success);
        assert_eq!(out.message, "¡Bienvenido Administrador!");
        assert_eq!(
            out.user,
            Some(PublicUser {
                id,
                name: "Administrador".into(),
                email: "admin@ejemplo.com".into(),
            })
        );
        let cookie = issued_session(&ctx).expect("cookie issued");
        assert_eq!(cookie.parse::<i64>().unwrap(), id);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized_without_cookie() {
        let (store, _) = store_with("Ana", "ana@example.com", "secreto").await;
        let mut ctx = RequestContext::default();

        let err = login(&store, &mut ctx, login_input("ana@example.com", "incorrecto"))
            .await
            .unwrap_err();

        assert_eq!(err, ActionError::Unauthorized("Contraseña incorrecta".into()));
        assert!(issued_session(&ctx).is_none());
    }

    #[tokio::test]
    async fn login_with_unknown_email_is_unauthorized() {
        let store = MemoryUserStore::new();
        let mut ctx = RequestContext::default();

        let err = login(&store, &mut ctx, login_input("ghost@example.com", "secreto"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "UNAUTHORIZED");
        assert_eq!(err.to_string(), "Usuario no encontrado");
        assert!(issued_session(&ctx).is_none());
    }

    #[tokio::test]
    async fn login_store_failure_becomes_generic_internal_error() {
        let mut ctx = RequestContext::default();
        let err = login(&BrokenStore, &mut ctx, login_input("a@b.co", "secreto"))
            .await
            .unwrap_err();
        assert_eq!(err, ActionError::Internal("Error interno del servidor".into()));
    }

    #[tokio::test]
    async fn login_with_corrupt_hash_is_internal() {
        let store = MemoryUserStore::new();
        store
            .create(NewUser {
                name: "Ana",
                email: "ana@example.com",
                password_hash: "not-a-phc-string",
            })
            .await
            .unwrap();
        let mut ctx = RequestContext::default();
        let err = login(&store, &mut ctx, login_input("ana@example.com", "secreto"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INTERNAL_SERVER_ERROR");
    }

    #[tokio::test]
    async fn register_creates_user_and_starts_session() {
        let store = MemoryUserStore::new();
        let mut ctx = RequestContext::default();

        let out = register(&store, &mut ctx, register_input("Ana", "ana@example.com", "secreto"))
            .await
            .expect("register");

        assert_eq!(
            out.message,
            "¡Bienvenido Ana! Tu cuenta ha sido creada exitosamente."
        );
        let user = out.user.expect("user in payload");
        assert_eq!(issued_session(&ctx), Some(user.id.to_string()));

        let stored = store.find_by_id(user.id).await.unwrap().expect("stored");
        assert_ne!(stored.password_hash, "secreto");

        let mut again = RequestContext::default();
        login(&store, &mut again, login_input("ana@example.com", "secreto"))
            .await
            .expect("new account can log in");
    }

    #[tokio::test]
    async fn register_duplicate_email_is_conflict_without_insert() {
        let (store, _) = store_with("Ana", "ana@example.com", "secreto").await;
        let mut ctx = RequestContext::default();

        let err = register(&store, &mut ctx, register_input("Otra", "ana@example.com", "secreto"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ActionError::Conflict("Ya existe un usuario con este email".into())
        );
        assert_eq!(store.len().await, 1);
        assert!(issued_session(&ctx).is_none());
    }

    #[tokio::test]
    async fn register_store_failure_becomes_internal_error() {
        let mut ctx = RequestContext::default();
        let err = register(&BrokenStore, &mut ctx, register_input("Ana", "a@b.co", "secreto"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ActionError::Internal("Error interno del servidor al crear la cuenta".into())
        );
        assert!(issued_session(&ctx).is_none());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let mut ctx = RequestContext::default();
        let first = logout(&mut ctx).await.expect("first logout");
        let second = logout(&mut ctx).await.expect("second logout");
        assert!(first.success && second.success);
        assert_eq!(second.message, "Has cerrado sesión exitosamente");
        assert_eq!(issued_session(&ctx), Some(String::new()));
    }
}
