//! Argon2id password hashing and verification.

use crate::error::AppError;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};

/// OWASP minimum for Argon2id: m=19456 (19MB), t=2, p=1.
pub const MIN_MEMORY_KIB: u32 = 19_456;
pub const MIN_ITERATIONS: u32 = 2;

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self {
            memory_kib: MIN_MEMORY_KIB,
            iterations: MIN_ITERATIONS,
            parallelism: 1,
        }
    }
}

impl WorkFactor {
    pub fn params(&self) -> Result<Params, argon2::Error> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
    }

    pub fn meets_floor(&self) -> bool {
        self.memory_kib >= MIN_MEMORY_KIB && self.iterations >= MIN_ITERATIONS
    }

    /// Cost recorded in an Argon2id PHC string. Other algorithms are an error.
    pub fn from_phc(hash: &PasswordHash<'_>) -> Result<Self, String> {
        if hash.algorithm != Algorithm::Argon2id.ident() {
            return Err(format!("expected argon2id, got {}", hash.algorithm));
        }
        let params = Params::try_from(hash).map_err(|e| e.to_string())?;
        Ok(Self {
            memory_kib: params.m_cost(),
            iterations: params.t_cost(),
            parallelism: params.p_cost(),
        })
    }
}

/// Hashes and verifies admin secrets.
///
/// Both operations are deliberately slow. Call them from a blocking context.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    /// Verified when an identifier is unknown so that path costs the same.
    decoy_hash: String,
}

impl SecretHasher {
    pub fn new(work: WorkFactor) -> Result<Self, AppError> {
        let params = work
            .params()
            .map_err(|e| AppError::Internal(format!("Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let decoy_hash = argon2
            .hash_password(b"decoy-secret-never-matches", &salt)
            .map_err(|e| AppError::Internal(format!("Argon2 hash: {}", e)))?
            .to_string();

        Ok(Self { argon2, decoy_hash })
    }

    /// Hash a secret with a fresh random salt into a PHC string.
    pub fn hash(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Argon2 hash: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Check `candidate` against a stored PHC string.
    ///
    /// Salt and cost come from `stored_hash`. Malformed hashes return false.
    /// The digest comparison is constant-time.
    pub fn verify(&self, candidate: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burn the same work as a real verification, always failing.
    pub fn verify_decoy(&self, candidate: &str) -> bool {
        let _ = self.verify(candidate, &self.decoy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cheap parameters keep the suite fast; the floor is enforced by config, not here.
    fn test_hasher() -> SecretHasher {
        SecretHasher::new(WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = test_hasher();
        let hash = hasher.hash("correct-horse").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct-horse", &hash));
    }

    #[test]
    fn test_one_character_off_fails() {
        let hasher = test_hasher();
        let hash = hasher.hash("correct-horse").unwrap();

        assert!(!hasher.verify("correct-hors", &hash));
        assert!(!hasher.verify("correct-horsf", &hash));
        assert!(!hasher.verify("Correct-horse", &hash));
        assert!(!hasher.verify("correct-horse ", &hash));
        assert!(!hasher.verify("", &hash));
    }

    #[test]
    fn test_salts_differ() {
        let hasher = test_hasher();
        let a = hasher.hash("same").unwrap();
        let b = hasher.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        let hasher = test_hasher();
        assert!(!hasher.verify("anything", ""));
        assert!(!hasher.verify("anything", "not-a-phc-string"));
        assert!(!hasher.verify("anything", "$argon2id$v=19$m=64,t=1,p=1$!!!$!!!"));
    }

    #[test]
    fn test_verify_uses_params_from_stored_hash() {
        let hash = test_hasher().hash("correct-horse").unwrap();

        let stronger = SecretHasher::new(WorkFactor {
            memory_kib: 128,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(stronger.verify("correct-horse", &hash));
    }

    #[test]
    fn test_decoy_never_matches() {
        let hasher = test_hasher();
        assert!(!hasher.verify_decoy("decoy-secret-never-matches"));
        assert!(!hasher.verify_decoy("anything"));
    }

    #[test]
    fn test_hash_encodes_work_factor() {
        let hasher = test_hasher();
        let hash = hasher.hash("x").unwrap();
        assert!(hash.contains("m=64,t=1,p=1"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = SecretHasher::new(WorkFactor {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_work_factor_from_phc() {
        let hash = test_hasher().hash("x").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert_eq!(
            WorkFactor::from_phc(&parsed).unwrap(),
            WorkFactor {
                memory_kib: 64,
                iterations: 1,
                parallelism: 1
            }
        );

        let argon2i = "$argon2i$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$WfJmLxvQ0mJbpt6zVlNz5n1nwMOk2V0S6CbRbnZbOAo";
        assert!(WorkFactor::from_phc(&PasswordHash::new(argon2i).unwrap()).is_err());

        let pbkdf2 = "$pbkdf2-sha256$i=600000,l=32$c29tZXNhbHRzb21lc2FsdA$WfJmLxvQ0mJbpt6zVlNz5n1nwMOk2V0S6CbRbnZbOAo";
        assert!(WorkFactor::from_phc(&PasswordHash::new(pbkdf2).unwrap()).is_err());
    }

    #[test]
    fn test_floor() {
        assert!(WorkFactor::default().meets_floor());
        assert!(!WorkFactor {
            memory_kib: 64,
            iterations: 1,
            parallelism: 1
        }
        .meets_floor());
    }
}
