use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// PHC-encoded Argon2id hash of `plain` with a fresh random salt.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(phc) => Ok(phc.to_string()),
        Err(e) => {
            error!(error = %e, "could not hash account password");
            anyhow::bail!("password hashing failed: {e}")
        }
    }
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let phc = match PasswordHash::new(stored) {
        Ok(phc) => phc,
        Err(e) => {
            error!(error = %e, "stored account hash is not a PHC string");
            anyhow::bail!("unreadable stored password hash: {e}")
        }
    };
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &phc)
        .is_ok())
}

/// Hashes on the blocking pool; Argon2 is deliberately CPU-heavy.
pub async fn hash_password_async(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&plain))
        .await
        .context("hash task panicked")?
}

pub async fn verify_password_async(plain: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("verify task panicked")?
}
