//! Credential hashing shared by the local auth backends.
//!
//! A single salted SHA-256 round: fine for the bundled demo backends, not for
//! production password storage.

use arena_core::model::UserId;
use sha2::{Digest, Sha256};

/// Minimum password length accepted when creating an account.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Salted SHA-256 of a password, hex encoded. The account id is the salt.
#[must_use]
pub fn hash_password(uid: UserId, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uid.as_uuid().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time comparison of two hex digests.
#[must_use]
pub fn digests_match(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
