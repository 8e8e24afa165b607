//! Password hashing with bcrypt.

use tokio::task;

use super::AuthError;

/// The bcrypt cost factor applied to every hash.
///
/// Hashing at this cost is slow on purpose to resist brute force; the
/// per-request latency is an accepted tradeoff, not a defect.
pub const BCRYPT_COST: u32 = 10;

/// Hashes a plaintext password with a per-hash random salt.
///
/// Runs on the blocking thread pool so the deliberately slow hash does
/// not stall the async runtime.
pub async fn hash(plaintext: &str) -> Result<String, AuthError> {
    let plaintext = plaintext.to_owned();
    let hashed = task::spawn_blocking(move || bcrypt::hash(plaintext, BCRYPT_COST)).await??;
    Ok(hashed)
}

/// Verifies a plaintext password against a stored hash.
///
/// Comparison semantics come from the bcrypt primitive itself. A wrong
/// password yields `Ok(false)`; a malformed stored hash is an error.
pub async fn verify(plaintext: &str, hashed: &str) -> Result<bool, AuthError> {
    let plaintext = plaintext.to_owned();
    let hashed = hashed.to_owned();
    let matches = task::spawn_blocking(move || bcrypt::verify(plaintext, &hashed)).await??;
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hashes_and_verifies() {
        let hashed = hash("secret123").await.unwrap();

        assert!(hashed.starts_with("$2"));
        assert!(verify("secret123", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_wrong_passwords() {
        let hashed = hash("correct password").await.unwrap();

        assert!(!verify("wrong password", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn salts_every_hash() {
        let first = hash("same password").await.unwrap();
        let second = hash("same password").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hashes_are_errors() {
        assert!(verify("whatever", "not a bcrypt hash").await.is_err());
    }
}
