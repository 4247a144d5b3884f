#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Guest access is disabled")]
    GuestNotAllowed,
    #[error("Missing or invalid guest id")]
    InvalidGuestId,
}
