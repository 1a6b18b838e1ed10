use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use super::AuthError;
use crate::config::SecurityConfig;

/// Argon2id hashing with configurable cost. Hashes are PHC strings, so
/// verification reads the parameters back from the stored hash.
#[derive(Debug, Clone)]
pub struct PasswordHashing {
    memory_kib: u32,
    iterations: u32,
}

impl PasswordHashing {
    pub fn new(memory_kib: u32, iterations: u32) -> Self {
        Self { memory_kib, iterations }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.argon2_memory_kib, config.argon2_iterations)
    }

    fn argon2(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.memory_kib, self.iterations, 1, None)
            .map_err(|e| AuthError::Hashing(format!("invalid argon2 params: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// A malformed stored hash is an error; a wrong password is `Ok(false)`
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Hashing(e.to_string())),
        }
    }

    /// Hash on the blocking pool; argon2 is deliberately slow
    pub async fn hash_blocking(&self, password: String) -> Result<String, AuthError> {
        let hashing = self.clone();
        tokio::task::spawn_blocking(move || hashing.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }

    pub async fn verify_blocking(&self, password: String, stored: String) -> Result<bool, AuthError> {
        let hashing = self.clone();
        tokio::task::spawn_blocking(move || hashing.verify(&password, &stored))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
    }
}
