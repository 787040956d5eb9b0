use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// PasswordDigest
///
/// A salted Argon2id digest in PHC string form. The only way to build one from
/// user input is `hash`, so holding a `PasswordDigest` means the plaintext is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hashes `plaintext` with a fresh random salt.
    pub fn hash(plaintext: &str) -> Result<Self, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)?
            .to_string();
        Ok(Self(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Checks `plaintext` against a stored PHC string.
///
/// A mismatch is `Ok(false)`; only a malformed stored digest is an error.
pub fn verify_password(plaintext: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)?;
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(err.into()),
    }
}
