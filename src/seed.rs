use anyhow::Context;
use tracing::{info, instrument};

use crate::auth::{password::hash_password_async, repo::UserStore, repo_types::NewUser};

pub const ADMIN_NAME: &str = "Administrador";
pub const ADMIN_EMAIL: &str = "admin@ejemplo.com";
/// Placeholder credential; change it after the first login.
pub const ADMIN_PASSWORD: &str = "password123";

/// Inserts the default administrator unless an account with its email exists.
/// Returns whether a row was inserted.
#[instrument(skip(store))]
pub async fn seed_admin(store: &dyn UserStore) -> anyhow::Result<bool> {
    if store
        .find_by_email(ADMIN_EMAIL)
        .await
        .context("check for seeded admin")?
        .is_some()
    {
        return Ok(false);
    }

    let hash = hash_password_async(ADMIN_PASSWORD.to_string()).await?;
    let user = store
        .create(NewUser {
            name: ADMIN_NAME,
            email: ADMIN_EMAIL,
            password_hash: &hash,
        })
        .await
        .context("insert seeded admin")?;

    info!(user_id = user.id, "default administrator seeded");
    Ok(true)
}
