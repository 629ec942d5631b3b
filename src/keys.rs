use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;
use tracing::warn;

const ARGON2_PREFIX: &str = "$argon2";

/// Hash a registration key for storage in the keys file.
pub fn hash_key(key: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(key.as_bytes(), &salt)?
        .to_string())
}

/// Check a submitted key against the one on file.
///
/// Keys on file may be argon2 PHC strings or plaintext; plaintext is
/// compared in constant time. An unparsable hash never matches.
pub fn verify_key(submitted: &str, on_file: &str) -> bool {
    if on_file.starts_with(ARGON2_PREFIX) {
        let parsed = match PasswordHash::new(on_file) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Registration key on file is not a valid argon2 hash");
                return false;
            }
        };
        return Argon2::default()
            .verify_password(submitted.as_bytes(), &parsed)
            .is_ok();
    }

    submitted.as_bytes().ct_eq(on_file.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plaintext_keys_compare_exactly() {
        assert!(verify_key("key-A", "key-A"));
        assert!(!verify_key("key-a", "key-A"));
        assert!(!verify_key("key-A ", "key-A"));
        assert!(!verify_key("", "key-A"));
    }

    #[test]
    fn hashed_keys_verify() {
        let hashed = hash_key("key-A").unwrap();
        assert!(hashed.starts_with(ARGON2_PREFIX));
        assert!(verify_key("key-A", &hashed));
        assert!(!verify_key("key-B", &hashed));
    }

    #[test]
    fn broken_hash_never_matches() {
        assert!(!verify_key("$argon2id$garbage", "$argon2id$garbage"));
    }
}
