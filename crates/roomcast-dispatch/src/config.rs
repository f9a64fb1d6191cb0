//! Dispatcher configuration.

use std::time::Duration;

/// Timeouts for the dispatcher's calls to external collaborators.
///
/// Nothing in the relay blocks indefinitely: a collaborator that does
/// not answer within its deadline is treated as failed for that one
/// operation, and the failure is reported to the sender only.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Deadline for one room-existence lookup.
    ///
    /// Default: 5 seconds.
    pub lookup_timeout: Duration,

    /// Deadline for one store append or history read.
    ///
    /// Default: 5 seconds.
    pub store_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
            store_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_config_default() {
        let config = DispatchConfig::default();
        assert_eq!(config.lookup_timeout, Duration::from_secs(5));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }
}
