//! Client runtime configuration object and helpers.

use std::time::Duration;

/// Email address granted the administrator role when no override is set.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@org.com";

/// Builder-style configuration for assembling the application context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub(crate) admin_email: String,
    pub(crate) retry: RetryPolicy,
}

impl Config {
    /// Construct a configuration with the stock admin account and retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            admin_email: DEFAULT_ADMIN_EMAIL.to_owned(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the email address that always resolves to the admin role.
    #[must_use]
    pub fn with_admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = email.into();
        self
    }

    /// Override the profile-lookup retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Email address that always resolves to the admin role.
    #[must_use]
    pub fn admin_email(&self) -> &str {
        self.admin_email.as_str()
    }

    /// Retry policy applied to the initial profile lookup.
    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded retry schedule for reads that race row creation.
///
/// A freshly signed-up identity may not have a profile row yet; the
/// resolver re-reads on this schedule before falling back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub(crate) attempts: u32,
    pub(crate) delay: Duration,
}

impl RetryPolicy {
    /// Construct a policy of `attempts` tries separated by `delay`.
    #[must_use]
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Number of attempts before the lookup is treated as absent.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Pause between consecutive attempts.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}
