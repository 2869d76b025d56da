//! Cooperative cancellation for kernel loops.
//!
//! Tokens are polled, never pushed: a loop asks [`CancelToken::check`] at
//! safe points and unwinds with [`Cancelled`] once the token has fired.

/// Pixels evaluated within one tile row between two checks.
pub const CANCEL_CHECK_INTERVAL_PIXELS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("render cancelled")]
pub struct Cancelled;

pub trait CancelToken: Send + Sync {
    fn is_cancelled(&self) -> bool;

    #[inline]
    fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// For callers that must run to completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelToken for NeverCancel {
    #[inline]
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> CancelToken for F
where
    F: Fn() -> bool + Send + Sync,
{
    #[inline]
    fn is_cancelled(&self) -> bool {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[test]
    fn test_never_cancel_always_passes_check() {
        assert_eq!(NeverCancel.check(), Ok(()));
        assert!(!NeverCancel.is_cancelled());
    }

    #[test]
    fn test_atomic_flag_fires_once_set() {
        let flag = AtomicBool::new(false);
        let token = || flag.load(Ordering::Acquire);
        assert_eq!(token.check(), Ok(()));

        flag.store(true, Ordering::Release);

        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn test_closure_token_counts_polls() {
        let polls = AtomicUsize::new(0);
        let token = || polls.fetch_add(1, Ordering::Relaxed) >= 2;

        assert!(token.check().is_ok());
        assert!(token.check().is_ok());
        assert_eq!(token.check(), Err(Cancelled));
    }

    #[test]
    fn test_cancelled_message() {
        assert_eq!(Cancelled.to_string(), "render cancelled");
    }
}
