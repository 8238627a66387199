//! Last-request-wins bookkeeping.
//!
//! Every user-initiated fetch takes a [`Ticket`] when it starts. Only the
//! holder of the newest ticket may apply its response; everything older
//! resolves to [`Resolution::Stale`] and is dropped without touching view
//! state.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic request counter owned by one view.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: AtomicU64,
}

/// Proof that a request was started at a particular generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a request, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no request has started since `ticket` was issued.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.0
    }

    /// Supersedes all outstanding tickets without starting a request.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }
}

/// Outcome of a guarded request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    /// The request was still the newest one; its result was applied.
    Current(T),
    /// A newer request started first; the result was discarded.
    Stale,
}

impl<T> Resolution<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Resolution::Stale)
    }

    /// The applied value, if any.
    pub fn into_current(self) -> Option<T> {
        match self {
            Resolution::Current(value) => Some(value),
            Resolution::Stale => None,
        }
    }

    pub fn as_current(&self) -> Option<&T> {
        match self {
            Resolution::Current(value) => Some(value),
            Resolution::Stale => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Current(value) => Resolution::Current(f(value)),
            Resolution::Stale => Resolution::Stale,
        }
    }
}
