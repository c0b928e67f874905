//! Bounded polling for host objects that appear asynchronously.
//!
//! Player elements and their metadata show up some time after the frame
//! loads. [`Waiter`] retries a probe on a fixed interval and gives up after a
//! fixed number of attempts (51 × 100 ms by default, ≈ 5.1 s).
//!
//! Time is injected through [`Sleeper`], so tests run without real timers:
//!
//! ```rust
//! use loudnorm_host::{RecordingSleeper, WaitError, WaitPolicy, Waiter};
//!
//! let mut waiter = Waiter::new(WaitPolicy::default(), RecordingSleeper::default());
//! let err = waiter.wait_for_condition(|_: &()| None::<u32>, &()).unwrap_err();
//! assert_eq!(err, WaitError::Timeout { attempts: 51 });
//! assert_eq!(waiter.sleeper().count(), 51);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;

use crate::Scope;

/// Default polling interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 51;

/// Errors produced when a wait gives up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WaitError {
    /// No element matched the selector within the attempt budget.
    #[error("not found '{selector}' after {attempts} attempts")]
    NotFound {
        /// Selector that never matched.
        selector: String,
        /// Attempts made.
        attempts: u32,
    },

    /// The condition never held within the attempt budget.
    #[error("timeout after {attempts} attempts")]
    Timeout {
        /// Attempts made.
        attempts: u32,
    },

    /// The wait was cancelled through its [`CancelToken`].
    #[error("wait cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts made before cancellation was observed.
        attempts: u32,
    },
}

/// Interval and attempt budget for a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Time slept before each attempt.
    pub interval: Duration,
    /// Attempts made before giving up.
    pub max_attempts: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl WaitPolicy {
    /// Upper bound on the time a single wait can take.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Source of delays between attempts.
pub trait Sleeper {
    /// Block for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// Sleeps on the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Records requested delays without sleeping.
///
/// Used by the simulator and tests, where waits must be instant and
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    slept: Vec<Duration>,
}

impl RecordingSleeper {
    /// Number of sleeps requested.
    pub fn count(&self) -> usize {
        self.slept.len()
    }

    /// Sum of all requested delays.
    pub fn total(&self) -> Duration {
        self.slept.iter().sum()
    }

    /// Every requested delay, in order.
    pub fn history(&self) -> &[Duration] {
        &self.slept
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.slept.push(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Shared flag that stops a wait before its budget runs out.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create an uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel every wait holding a clone of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

enum PollFailure {
    Exhausted(u32),
    Cancelled(u32),
}

/// Bounded retry loop.
#[derive(Debug)]
pub struct Waiter<S: Sleeper = ThreadSleeper> {
    policy: WaitPolicy,
    sleeper: S,
    cancel: Option<CancelToken>,
}

impl<S: Sleeper> Waiter<S> {
    /// Create a waiter with the given policy and sleeper.
    pub fn new(policy: WaitPolicy, sleeper: S) -> Self {
        Self {
            policy,
            sleeper,
            cancel: None,
        }
    }

    /// Attach a cancellation token checked before every attempt.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// The active policy.
    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// The sleeper, e.g. to inspect a [`RecordingSleeper`].
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Polls `scope` for `selector` until it matches or the budget runs out.
    pub fn wait_for_element<E, Sc: Scope<E> + ?Sized>(
        &mut self,
        selector: &str,
        scope: &Sc,
    ) -> Result<E, WaitError> {
        let found = self.poll(|| {
            let element = scope.query_selector(selector);
            if element.is_some() {
                tracing::info!("found '{selector}'");
            } else {
                tracing::debug!("wait for '{selector}'");
            }
            element
        });

        found.map_err(|failure| match failure {
            PollFailure::Exhausted(attempts) => {
                tracing::error!("not found '{selector}'");
                WaitError::NotFound {
                    selector: selector.to_string(),
                    attempts,
                }
            }
            PollFailure::Cancelled(attempts) => {
                tracing::warn!("wait for '{selector}' cancelled");
                WaitError::Cancelled { attempts }
            }
        })
    }

    /// Polls `predicate(arg)` until it returns `Some` or the budget runs out.
    pub fn wait_for_condition<A, T, F>(&mut self, mut predicate: F, arg: &A) -> Result<T, WaitError>
    where
        A: ?Sized,
        F: FnMut(&A) -> Option<T>,
    {
        let result = self.poll(|| {
            let value = predicate(arg);
            if value.is_some() {
                tracing::info!("condition met");
            } else {
                tracing::debug!("retry");
            }
            value
        });

        result.map_err(|failure| match failure {
            PollFailure::Exhausted(attempts) => {
                tracing::error!("timeout");
                WaitError::Timeout { attempts }
            }
            PollFailure::Cancelled(attempts) => {
                tracing::warn!("wait cancelled");
                WaitError::Cancelled { attempts }
            }
        })
    }

    fn poll<T>(&mut self, mut probe: impl FnMut() -> Option<T>) -> Result<T, PollFailure> {
        for attempt in 0..self.policy.max_attempts {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Err(PollFailure::Cancelled(attempt));
            }
            self.sleeper.sleep(self.policy.interval);
            if let Some(value) = probe() {
                return Ok(value);
            }
        }
        Err(PollFailure::Exhausted(self.policy.max_attempts))
    }
}
