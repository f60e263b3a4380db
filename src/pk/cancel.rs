//! Cooperative cancellation for curve requests
//!
//! Fast parameter changes (dragging a time range) supersede requests that are
//! still running. A [`CancellationToken`] lets the requester stop a computation
//! early, and a [`RequestGeneration`] lets it discard results that arrive after
//! a newer request was issued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared flag checked between samples of a curve computation
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Monotonic request counter; only the latest ticket is current
#[derive(Debug, Default)]
pub struct RequestGeneration {
    counter: AtomicU64,
}

/// Identifies one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding every earlier one
    pub fn next(&self) -> Ticket {
        Ticket(self.counter.fetch_add(1, Ordering::AcqRel) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.counter.load(Ordering::Acquire) == ticket.0
    }

    /// Return `result` only if `ticket` is still the latest request
    pub fn accept<T>(&self, ticket: Ticket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            tracing::debug!(ticket = ticket.0, "Discarding superseded result");
            None
        }
    }
}
