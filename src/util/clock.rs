//! Time helpers for blocking calls with optional timeouts.

use std::time::Duration;

use tokio::time::Instant;

/// Absolute point after which a blocking call gives up. `None` waits forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now, or never when `timeout` is `None` or too
    /// large to represent as an instant.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.and_then(|t| Instant::now().checked_add(t)))
    }

    /// A deadline that never expires.
    pub const fn never() -> Self {
        Self(None)
    }

    /// Time left before expiry; `None` means unbounded. Saturates at zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.0
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// True once the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.remaining().is_some_and(|left| left.is_zero())
    }

    /// Underlying instant, if bounded.
    pub const fn instant(&self) -> Option<Instant> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_is_unbounded() {
        let deadline = Deadline::never();
        assert_eq!(deadline.remaining(), None);
        assert!(!deadline.is_expired());
        assert_eq!(Deadline::after(None), deadline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_timeout() {
        let deadline = Deadline::after(Some(Duration::from_millis(50)));
        assert!(!deadline.is_expired());
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_unrepresentable_timeout_never_expires() {
        let deadline = Deadline::after(Some(Duration::MAX));
        assert_eq!(deadline, Deadline::never());
        assert_eq!(deadline.remaining(), None);
        assert!(!deadline.is_expired());
    }

    #[test]
    fn test_zero_timeout_is_already_expired() {
        assert!(Deadline::after(Some(Duration::ZERO)).is_expired());
    }
}
