//! Password hashing and token generation.
//!
//! This is the primitive layer the (out of scope) API process builds
//! registration, login, and password reset on top of. It implements §4.4's
//! contract: a memory-hard KDF for passwords, and cryptographically secure
//! random tokens for API keys and session tokens.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params};
use rand::RngCore;

use crate::error::{StoreError, StoreResult};

/// Argon2id parameters: 64 MiB memory, 3 iterations, 4 lanes, 32-byte output.
fn params() -> Params {
    Params::new(64 * 1024, 3, 4, Some(32)).expect("static Argon2 params are valid")
}

/// Hash a plaintext password, returning a self-describing PHC string that
/// embeds the salt and parameters used.
pub fn hash_password(plaintext: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params());
    argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Backend(format!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a previously hashed PHC string.
pub fn verify_password(hash: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(plaintext.as_bytes(), &parsed).is_ok()
}

/// Generate a cryptographically secure random hex token of `len` hex digits.
pub fn generate_token(len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rand::thread_rng().fill_bytes(&mut bytes);
    let mut hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex.truncate(len);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_round_trips() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn tokens_have_requested_length_and_differ() {
        let a = generate_token(32);
        let b = generate_token(32);
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
