use thiserror::Error;

/// Errors from the password hashing and session token services.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Password hashing or verification failed.
    #[error("password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),

    /// Token signing or validation failed.
    #[error("token validation failed")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// The blocking hashing task was cancelled or panicked.
    #[error("hashing task failed")]
    Runtime(#[from] tokio::task::JoinError),
}
