//! Authentication hook for validating a connection's identity.
//!
//! Roomcast doesn't verify credentials itself — that's the auth
//! collaborator's job (JWT validation, an auth API, whatever the
//! deployment uses). The relay only defines the [`Authenticator`] trait:
//! one async method from credential token to [`UserId`], called at most
//! once per authentication event and always bounded by a timeout so a
//! stuck auth backend can't hang a connection's event loop.

use std::time::Duration;

use roomcast_protocol::UserId;

use crate::AuthError;

/// Validates a credential token and returns the user it belongs to.
///
/// `Send + Sync + 'static` because the gateway shares one authenticator
/// across every connection handler task for the life of the server.
///
/// # Example
///
/// ```rust
/// use roomcast_session::{Authenticator, AuthError};
/// use roomcast_protocol::UserId;
///
/// /// Accepts any non-empty token and uses it as the user id.
/// /// Development only — never deploy this.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
///         if token.is_empty() {
///             return Err(AuthError::InvalidCredentials);
///         }
///         Ok(UserId::new(token))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Validates the given token.
    ///
    /// # Returns
    /// - `Ok(UserId)` — the verified identity
    /// - `Err(AuthError::InvalidCredentials)` — token rejected
    /// - `Err(AuthError::Expired)` — token was valid once, not anymore
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, AuthError>> + Send;
}

/// Runs [`Authenticator::verify`] with a deadline.
///
/// A verification that outlives `timeout` is reported as
/// [`AuthError::Timeout`]; the caller treats it like any other failed
/// authentication (connection stays open, stays anonymous).
pub async fn verify_with_timeout<A: Authenticator>(
    auth: &A,
    token: &str,
    timeout: Duration,
) -> Result<UserId, AuthError> {
    match tokio::time::timeout(timeout, auth.verify(token)).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowAuth;

    impl Authenticator for SlowAuth {
        async fn verify(&self, _token: &str) -> Result<UserId, AuthError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(UserId::new("too-late"))
        }
    }

    struct EchoAuth;

    impl Authenticator for EchoAuth {
        async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
            Ok(UserId::new(token))
        }
    }

    #[tokio::test]
    async fn test_verify_with_timeout_passes_through_success() {
        let user =
            verify_with_timeout(&EchoAuth, "alice", Duration::from_secs(5))
                .await
                .unwrap();
        assert_eq!(user, UserId::new("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_with_timeout_maps_elapsed_to_timeout() {
        let result =
            verify_with_timeout(&SlowAuth, "alice", Duration::from_millis(50))
                .await;
        assert!(matches!(result, Err(AuthError::Timeout)));
    }
}
