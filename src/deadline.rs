//! Wall-clock budgets for outbound calls.
//!
//! Every backend call runs through [`bounded`], which resolves to either the
//! call's own output or [`Bounded::TimedOut`]. Timeouts are values, never
//! errors, so callers fold them into "no data" the same way they fold
//! backend failures.
//!
//! A request owns one [`RequestDeadline`]; each call asks it for a
//! sub-budget capped by whatever time is left.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Outcome of a budgeted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bounded<T> {
    Completed(T),
    TimedOut,
}

/// Run `fut` for at most `budget`.
///
/// On timeout the future is dropped, which aborts an in-flight reqwest
/// request and releases its connection. The timer is dropped on both paths.
/// A zero budget returns `TimedOut` without polling `fut`.
pub async fn bounded<F>(budget: Duration, fut: F) -> Bounded<F::Output>
where
    F: Future,
{
    if budget.is_zero() {
        return Bounded::TimedOut;
    }
    match tokio::time::timeout(budget, fut).await {
        Ok(output) => Bounded::Completed(output),
        Err(_) => Bounded::TimedOut,
    }
}

/// One deadline clock per request.
#[derive(Debug, Clone, Copy)]
pub struct RequestDeadline {
    expires_at: Instant,
}

impl RequestDeadline {
    pub fn starting_now(total: Duration) -> Self {
        Self {
            expires_at: Instant::now() + total,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Sub-budget for one call: `cap`, shortened to what is left.
    pub fn budget_for(&self, cap: Duration) -> Duration {
        cap.min(self.remaining())
    }

    /// Run `fut` under `min(cap, remaining)`.
    pub async fn run<F>(&self, cap: Duration, fut: F) -> Bounded<F::Output>
    where
        F: Future,
    {
        bounded(self.budget_for(cap), fut).await
    }
}
