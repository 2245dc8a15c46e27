//! Single-writer navigation with supersede semantics
//!
//! Each navigation request gets a ticket. Only the most recently issued
//! ticket may commit its result; anything computed for an older ticket is
//! dropped. Rapid repeated input therefore collapses to the last request
//! instead of queueing.

use crate::cursor::{transition, Cursor, CursorState, NavContext, NavEvent};
use crate::loader::{IndexLoader, IndexSnapshot};
use crate::matcher::OccurrenceMatcher;
use std::sync::Arc;
use tracing::debug;

/// A navigation request, detached from the session so it can be computed
/// on another task.
#[derive(Clone)]
pub struct NavRequest {
    ticket: u64,
    event: NavEvent,
    base: CursorState,
    index: Arc<IndexSnapshot>,
    matcher: Arc<OccurrenceMatcher>,
}

impl NavRequest {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    pub fn event(&self) -> NavEvent {
        self.event
    }

    /// Run the transition. Pure, so it is safe to call from any thread.
    pub fn compute(self) -> NavOutcome {
        let ctx = NavContext::new(&self.index, &self.matcher);
        let state = transition(self.base, &ctx, self.event);
        // Warm the cache for the position we land on
        ctx.occurrences(&state);
        NavOutcome {
            ticket: self.ticket,
            state,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavOutcome {
    pub ticket: u64,
    pub state: CursorState,
}

pub struct NavigationSession {
    loader: Arc<IndexLoader>,
    matcher: Arc<OccurrenceMatcher>,
    state: CursorState,
    latest_ticket: u64,
}

impl NavigationSession {
    pub fn new(loader: Arc<IndexLoader>, matcher: Arc<OccurrenceMatcher>) -> Self {
        Self {
            loader,
            matcher,
            state: CursorState::default(),
            latest_ticket: 0,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.loader.is_ready()
    }

    /// Issue a request. Any request issued earlier is superseded.
    /// Returns `None` while the index is not loaded.
    pub fn request(&mut self, event: NavEvent) -> Option<NavRequest> {
        let index = self.loader.snapshot()?;
        self.latest_ticket += 1;
        Some(NavRequest {
            ticket: self.latest_ticket,
            event,
            base: self.state,
            index,
            matcher: Arc::clone(&self.matcher),
        })
    }

    /// Apply a computed outcome if it belongs to the latest request.
    pub fn commit(&mut self, outcome: NavOutcome) -> bool {
        if outcome.ticket != self.latest_ticket {
            debug!(
                ticket = outcome.ticket,
                latest = self.latest_ticket,
                "discarding superseded navigation result"
            );
            return false;
        }
        self.state = outcome.state;
        true
    }

    /// Request, compute and commit in one step.
    pub fn navigate(&mut self, event: NavEvent) -> CursorState {
        if let Some(request) = self.request(event) {
            let outcome = request.compute();
            self.commit(outcome);
        }
        self.state
    }

    /// Like [`navigate`](Self::navigate), with the computation on the
    /// blocking thread pool.
    pub async fn navigate_async(&mut self, event: NavEvent) -> CursorState {
        let Some(request) = self.request(event) else {
            return self.state;
        };
        match tokio::task::spawn_blocking(move || request.compute()).await {
            Ok(outcome) => {
                self.commit(outcome);
            }
            Err(e) => debug!("navigation task failed: {}", e),
        }
        self.state
    }

    /// Read access to the cursor at the committed state, for the duration
    /// of `f`. Returns `None` while the index is not loaded.
    pub fn with_cursor<R>(&self, f: impl FnOnce(&Cursor<'_>) -> R) -> Option<R> {
        let index = self.loader.snapshot()?;
        let cursor = Cursor::with_state(NavContext::new(&index, &self.matcher), self.state);
        Some(f(&cursor))
    }
}
