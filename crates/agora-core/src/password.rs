use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};

use crate::error::{Error, Result};

/// Argon2id password hashing with the crate's default (fixed) work factor.
///
/// Both operations are CPU bound. Async callers should run them on a blocking
/// thread.
#[derive(Clone, Default)]
pub struct Passwords {
    argon2: Argon2<'static>,
}

impl Passwords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum-cost parameters so unit tests do not spend seconds hashing.
    #[cfg(test)]
    pub(crate) fn cheap() -> Self {
        let params = argon2::Params::new(8, 1, 1, None).unwrap();
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        }
    }

    /// Produce a salted PHC-format digest.
    pub fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| Error::Internal(format!("password hashing failed: {e}")))?;
        Ok(digest.to_string())
    }

    /// `Ok(false)` on mismatch. An unparsable stored digest is an internal
    /// error, not a mismatch.
    pub fn verify(&self, plaintext: &str, digest: &str) -> Result<bool> {
        let parsed = PasswordHash::new(digest)
            .map_err(|e| Error::Internal(format!("stored password digest is corrupt: {e}")))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(Error::Internal(format!("password verification failed: {e}"))),
        }
    }
}
