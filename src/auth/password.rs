use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;
use tracing::error;

/// Hashes a member or staff password with argon2id and a fresh salt.
/// Stored hashes carry their own parameters, so verification keeps
/// working if the defaults change later.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(plain.as_bytes(), &salt) {
        Ok(hash) => Ok(hash.to_string()),
        Err(e) => {
            error!(error = %e, "password hashing failed");
            Err(anyhow::anyhow!("password hashing failed: {e}"))
        }
    }
}

/// A mismatched password is `Ok(false)`; a stored hash that cannot be
/// parsed is an error, since it means the row itself is corrupt.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = match PasswordHash::new(stored) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "stored password hash is malformed");
            return Err(anyhow::anyhow!("malformed password hash: {e}"));
        }
    };
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_password_survives_hash_and_verify() {
        let hash = hash_password("rainy-tuesday-AA17").unwrap();
        assert!(verify_password("rainy-tuesday-AA17", &hash).unwrap());
        assert!(!verify_password("rainy-wednesday-AA17", &hash).unwrap());
    }

    #[test]
    fn same_password_hashes_differently_each_time() {
        let first = hash_password("un dia a la vez").unwrap();
        let second = hash_password("un dia a la vez").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("un dia a la vez", &first).unwrap());
        assert!(verify_password("un dia a la vez", &second).unwrap());
    }

    #[test]
    fn corrupt_stored_hash_is_an_error_not_a_mismatch() {
        assert!(verify_password("whatever", "$argon2id$garbage").is_err());
        assert!(verify_password("whatever", "").is_err());
    }
}
