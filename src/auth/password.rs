use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Argon2 PHC string with a fresh random salt.
pub fn hash(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("argon2 hash: {e}"))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("argon2 parse: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

// argon2 is CPU-bound; keep it off the async workers.
pub async fn hash_blocking(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash(&plain))
        .await
        .context("join password hash task")?
}

pub async fn verify_blocking(plain: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify(&plain, &stored))
        .await
        .context("join password verify task")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let stored = hash("pw123456").expect("hash");
        assert!(stored.starts_with("$argon2"));
        assert!(verify("pw123456", &stored).expect("verify"));
        assert!(!verify("pw1234567", &stored).expect("verify"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash("pw123456").unwrap();
        let b = hash("pw123456").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        assert!(verify("anything", "not-a-valid-hash").is_err());
    }

    #[tokio::test]
    async fn blocking_wrappers_agree() {
        let stored = hash_blocking("open sesame".into()).await.unwrap();
        assert!(verify_blocking("open sesame".into(), stored.clone())
            .await
            .unwrap());
        assert!(!verify_blocking("close sesame".into(), stored).await.unwrap());
    }
}
