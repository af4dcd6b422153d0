//! Notification channel
//!
//! A process-wide user-notice channel with a single active subscriber,
//! passed around as an explicit handle instead of a mutable module global.
//! Views subscribe on mount and the subscription unregisters itself on drop;
//! notices sent with no subscriber are logged and dropped, best-effort.

use std::sync::{Arc, Mutex};

use tracing::debug;

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A message to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

type Callback = Box<dyn Fn(Notice) + Send + Sync>;

struct Registration {
    generation: u64,
    callback: Callback,
}

#[derive(Default)]
struct Inner {
    next_generation: u64,
    active: Option<Registration>,
}

/// Cloneable handle to the notification channel.
#[derive(Clone, Default)]
pub struct Notifier {
    inner: Arc<Mutex<Inner>>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` as the single active subscriber, replacing any
    /// previous one. The returned guard unregisters on drop; dropping a
    /// superseded guard leaves the newer subscriber in place.
    pub fn subscribe(&self, callback: impl Fn(Notice) + Send + Sync + 'static) -> Subscription {
        let generation = {
            let Ok(mut inner) = self.inner.lock() else {
                return Subscription {
                    notifier: self.clone(),
                    generation: 0,
                };
            };

            inner.next_generation += 1;
            let generation = inner.next_generation;
            inner.active = Some(Registration {
                generation,
                callback: Box::new(callback),
            });

            generation
        };

        Subscription {
            notifier: self.clone(),
            generation,
        }
    }

    /// Deliver a notice to the active subscriber, if any.
    pub fn notify(&self, notice: Notice) {
        let Ok(inner) = self.inner.lock() else {
            return;
        };

        match &inner.active {
            Some(registration) => (registration.callback)(notice),
            None => debug!(?notice, "notice dropped: no subscriber"),
        }
    }

    fn unregister(&self, generation: u64) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        if inner
            .active
            .as_ref()
            .is_some_and(|registration| registration.generation == generation)
        {
            inner.active = None;
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

/// Active registration guard; unregisters its subscriber on drop.
#[derive(Debug)]
pub struct Subscription {
    notifier: Notifier,
    generation: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.notifier.unregister(self.generation);
    }
}
