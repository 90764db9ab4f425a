//! Admin password hashing
//!
//! Hashes are standard bcrypt strings (`$2b$<cost>$...`), so databases carried
//! over from earlier deployments keep working.

pub use bcrypt::{BcryptError, DEFAULT_COST};

/// Hash a password with a fresh salt at the given bcrypt cost
pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(password, cost)
}

/// Check a password against a stored hash. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match bcrypt::verify(password, stored) {
        Ok(matches) => matches,
        Err(e) => {
            tracing::warn!("Stored admin password hash is unreadable: {}", e);
            false
        }
    }
}
