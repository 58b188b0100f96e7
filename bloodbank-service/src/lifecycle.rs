//! Process lifecycle
//!
//! `Starting → Ready → Draining → Stopped`, forward only. The server marks
//! Ready once it is accepting, a shutdown signal moves it to Draining, and
//! Stopped is reached after in-flight requests finish and the store is
//! closed. Readiness reports true only while Ready.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Starting,
    Ready,
    Draining,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::Draining => write!(f, "draining"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Shared handle to the current phase
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<Phase>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Phase::Starting);
        Self { tx: Arc::new(tx) }
    }

    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// Move to a later phase; staying put or moving back is an error
    pub fn advance(&self, to: Phase) -> Result<()> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|current| {
            if to > *current {
                tracing::info!(from = %current, to = %to, "Lifecycle transition");
                *current = to;
                true
            } else {
                outcome = Err(Error::Lifecycle { from: *current, to });
                false
            }
        });
        outcome
    }

    /// Enter Draining unless already there or beyond; returns whether this call moved it
    pub fn begin_draining(&self) -> bool {
        self.advance(Phase::Draining).is_ok()
    }

    /// Resolve once the phase is at least `phase`
    pub async fn reached(&self, phase: Phase) {
        let mut rx = self.tx.subscribe();
        // the sender lives as long as `self`, so this cannot fail
        let _ = rx.wait_for(|current| *current >= phase).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_forward_transitions() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Starting);
        assert!(!lifecycle.is_ready());

        lifecycle.advance(Phase::Ready).unwrap();
        assert!(lifecycle.is_ready());
        lifecycle.advance(Phase::Draining).unwrap();
        lifecycle.advance(Phase::Stopped).unwrap();
        assert_eq!(lifecycle.phase(), Phase::Stopped);
    }

    #[test]
    fn test_backward_and_repeated_transitions_are_rejected() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Draining).unwrap();

        let err = lifecycle.advance(Phase::Ready).unwrap_err();
        assert!(matches!(
            err,
            Error::Lifecycle {
                from: Phase::Draining,
                to: Phase::Ready
            }
        ));
        assert!(lifecycle.advance(Phase::Draining).is_err());
        assert_eq!(lifecycle.phase(), Phase::Draining);
    }

    #[test]
    fn test_begin_draining_is_idempotent() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Ready).unwrap();
        assert!(lifecycle.begin_draining());
        assert!(!lifecycle.begin_draining());
        assert_eq!(lifecycle.phase(), Phase::Draining);
    }

    #[tokio::test]
    async fn test_reached_wakes_waiters() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.reached(Phase::Draining).await })
        };

        lifecycle.advance(Phase::Ready).unwrap();
        lifecycle.begin_draining();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_reached_returns_immediately_when_past() {
        let lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Stopped).unwrap();
        tokio::time::timeout(Duration::from_millis(100), lifecycle.reached(Phase::Draining))
            .await
            .unwrap();
    }
}
