// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Coalesced change notification for the rendering layer

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    notify: Notify,
    pending: AtomicBool,
}

/// Signals that rows changed. Any number of signals raised before the
/// consumer looks collapse into one.
#[derive(Debug, Clone, Default)]
pub struct RowsChanged {
    inner: Arc<Inner>,
}

impl RowsChanged {
    /// New notifier with nothing pending
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Returns true if nothing was pending before.
    pub fn signal(&self) -> bool {
        let fresh = !self.inner.pending.swap(true, Ordering::AcqRel);
        if fresh {
            self.inner.notify.notify_one();
        }
        fresh
    }

    /// Whether a signal is waiting to be consumed
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.load(Ordering::Acquire)
    }

    /// Consume the pending signal, if any
    pub fn take_pending(&self) -> bool {
        self.inner.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait for the next signal and consume it
    pub async fn changed(&self) {
        loop {
            if self.take_pending() {
                return;
            }
            self.inner.notify.notified().await;
        }
    }
}
