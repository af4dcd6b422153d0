//! Optimistic updates
//!
//! Tentative state with a compensating action on failure: flip the value
//! locally, fire the request, then commit on success or roll back to the
//! previous value on failure. The cart cache never uses this — it commits
//! only after confirmation — but toggle-style mutations elsewhere do.

/// A value updated ahead of server confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimistic<T> {
    previous: T,
    current: T,
}

impl<T> Optimistic<T> {
    /// Apply `next` tentatively, remembering `previous` for rollback.
    #[must_use]
    pub fn apply(previous: T, next: T) -> Self {
        Self {
            previous,
            current: next,
        }
    }

    /// The tentative value, shown while the request is outstanding.
    #[must_use]
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The server confirmed: keep the tentative value.
    #[must_use]
    pub fn commit(self) -> T {
        self.current
    }

    /// The request failed: restore the previous value.
    #[must_use]
    pub fn rollback(self) -> T {
        self.previous
    }

    /// Resolve from a request outcome in one step.
    #[must_use]
    pub fn resolve<E>(self, outcome: &Result<(), E>) -> T {
        match outcome {
            Ok(()) => self.commit(),
            Err(_) => self.rollback(),
        }
    }
}
