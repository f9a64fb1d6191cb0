//! Session layer configuration.

use std::time::Duration;

/// Configuration for connection/authentication behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Deadline for one `Authenticator::verify` call. A verification
    /// that takes longer is treated as failed (`AuthError::Timeout`);
    /// the connection stays open and anonymous.
    ///
    /// Default: 5 seconds.
    pub auth_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(5),
        }
    }
}
