//! Customer password hashing. Hashes are argon2id PHC strings stored in `users.password_hash`.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(anyhow::anyhow!("hash password: {e}"))
        }
    }
}

/// `Ok(false)` on a mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("parse stored hash: {e}")
    })?;
    Ok(Argon2::default().verify_password(plain.as_bytes(), &parsed).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_password_verifies_against_its_hash() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("secret1"));
        assert!(verify_password("secret1", &hash).unwrap());
        assert!(!verify_password("Secret1", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_a_fresh_salt_per_customer() {
        let ada = hash_password("secret1").unwrap();
        let bob = hash_password("secret1").unwrap();
        assert_ne!(ada, bob);
        assert!(verify_password("secret1", &bob).unwrap());
    }

    #[test]
    fn unreadable_stored_hash_is_an_error() {
        let err = verify_password("secret1", "x").unwrap_err();
        assert!(err.to_string().starts_with("parse stored hash"));
    }
}
