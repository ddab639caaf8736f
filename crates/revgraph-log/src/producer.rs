// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Commit stream producer contract
//!
//! A producer lists commits for a [`LogQuery`] on a background thread and
//! delivers them through an [`EventSink`], tagged with the generation of the
//! refresh cycle that started it. Every start ends with exactly one terminal
//! event: `Completed`, `Failed` or `Cancelled`.
//!
//! Records are emitted on demand. The consumer raises the depth budget via
//! [`ProducerHandle::request_depth`]; once the budget is spent the producer
//! parks until more depth is requested or it is cancelled.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;

use tokio::sync::mpsc;
use tracing::debug;

use crate::commit::CommitRecord;
use crate::error::LogError;
use crate::query::LogQuery;

/// Identifies one refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation following this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something a producer reports
#[derive(Debug)]
pub enum ProducerEvent {
    /// One commit, in the order the source listed it
    Record(CommitRecord),
    /// One malformed record was skipped
    ParseError(LogError),
    /// The stream ended normally after emitting `count` records
    Completed {
        /// Number of records emitted
        count: usize,
    },
    /// The stream ended with an error
    Failed(LogError),
    /// The stream stopped because it was cancelled
    Cancelled,
}

impl ProducerEvent {
    /// Whether this event ends the stream
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Failed(_) | Self::Cancelled
        )
    }
}

/// A producer event tagged with the cycle it belongs to
#[derive(Debug)]
pub struct Tagged {
    /// Generation of the producer that sent the event
    pub generation: Generation,
    /// The event itself
    pub event: ProducerEvent,
}

/// Receiving side of the event channel
pub type EventReceiver = mpsc::UnboundedReceiver<Tagged>;

/// Sending side of the event channel
pub type EventSender = mpsc::UnboundedSender<Tagged>;

/// Create the channel shared by all producers of one consumer
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Tags and forwards events for a single producer start
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: EventSender,
}

impl EventSink {
    /// Bind a sender to a generation
    #[must_use]
    pub fn new(generation: Generation, tx: EventSender) -> Self {
        Self { generation, tx }
    }

    /// Generation this sink tags events with
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Forward an event. Returns false once the receiver is gone.
    pub fn send(&self, event: ProducerEvent) -> bool {
        self.tx
            .send(Tagged {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

#[derive(Debug, Default)]
struct GateState {
    depth: usize,
    cancelled: bool,
    parked: bool,
}

/// Depth budget and cancellation flag shared between a producer thread and
/// its handle
#[derive(Debug, Clone, Default)]
pub struct DemandGate {
    inner: Arc<(Mutex<GateState>, Condvar)>,
}

impl DemandGate {
    /// Create a gate with an initial depth budget
    #[must_use]
    pub fn new(initial_depth: usize) -> Self {
        let gate = Self::default();
        gate.state().depth = initial_depth;
        gate
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raise the depth budget. Returns false if `depth` does not exceed the
    /// current budget.
    pub fn request_depth(&self, depth: usize) -> bool {
        let mut state = self.state();
        if depth <= state.depth {
            return false;
        }
        state.depth = depth;
        self.inner.1.notify_all();
        true
    }

    /// Current depth budget
    #[must_use]
    pub fn depth(&self) -> usize {
        self.state().depth
    }

    /// Request cancellation and wake a parked producer
    pub fn cancel(&self) {
        self.state().cancelled = true;
        self.inner.1.notify_all();
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state().cancelled
    }

    /// Whether the producer is blocked waiting for more depth
    #[must_use]
    pub fn is_parked(&self) -> bool {
        self.state().parked
    }

    /// Block until the budget exceeds `emitted`. Returns false if cancelled.
    pub fn wait_for_budget(&self, emitted: usize) -> bool {
        let mut state = self.state();
        let granted = loop {
            if state.cancelled {
                break false;
            }
            if state.depth > emitted {
                break true;
            }
            state.parked = true;
            state = self
                .inner
                .1
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        };
        state.parked = false;
        granted
    }
}

/// Control handle for a running producer
///
/// Dropping the handle cancels the producer.
#[derive(Debug)]
pub struct ProducerHandle {
    generation: Generation,
    gate: DemandGate,
}

impl ProducerHandle {
    /// Wrap the gate of a started producer
    #[must_use]
    pub fn new(generation: Generation, gate: DemandGate) -> Self {
        Self { generation, gate }
    }

    /// Generation of the producer
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Cooperative, fire-and-forget cancellation. Records already in flight
    /// may still be delivered.
    pub fn cancel(&self) {
        debug!(generation = %self.generation, "Cancelling producer");
        self.gate.cancel();
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.gate.is_cancelled()
    }

    /// Raise the depth budget. Returns false if nothing changed.
    pub fn request_depth(&self, depth: usize) -> bool {
        self.gate.request_depth(depth)
    }

    /// Current depth budget
    #[must_use]
    pub fn requested_depth(&self) -> usize {
        self.gate.depth()
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        self.gate.cancel();
    }
}

/// Something that can list commits for a query
pub trait CommitStreamProducer: Send + Sync {
    /// Begin listing commits for `query`, emitting at most `initial_depth`
    /// records before more depth is requested.
    ///
    /// # Errors
    ///
    /// Returns `LogError::ProducerStart` (or a repository error) if the
    /// stream cannot be started at all. No events are sent in that case.
    fn start(
        &self,
        query: &LogQuery,
        initial_depth: usize,
        sink: EventSink,
    ) -> Result<ProducerHandle, LogError>;
}

/// How a drained record stream ended, before the terminal event is sent
#[derive(Debug)]
pub(crate) enum StreamEnd {
    /// The source ran dry
    Exhausted(usize),
    /// The query limit was reached
    LimitReached(usize),
    /// Cancellation was observed
    Cancelled,
    /// The source failed
    Failed(LogError),
}

/// Pump records from `source` to `sink`, honouring the query filter and
/// limit, the depth budget and cancellation.
///
/// Parse errors are forwarded and skipped. Any other source error stops the
/// stream.
pub(crate) fn drain<I>(source: I, query: &LogQuery, gate: &DemandGate, sink: &EventSink) -> StreamEnd
where
    I: IntoIterator<Item = Result<CommitRecord, LogError>>,
{
    let limit = query.effective_limit();
    let mut emitted = 0;
    if limit == 0 {
        return StreamEnd::LimitReached(0);
    }

    let mut source = source.into_iter();
    loop {
        if gate.is_cancelled() {
            return StreamEnd::Cancelled;
        }
        let Some(item) = source.next() else {
            break;
        };
        match item {
            Ok(record) => {
                if !query.matches(&record) {
                    continue;
                }
                // park holding the next record, so a source that ends
                // exactly at the budget still completes
                if !gate.wait_for_budget(emitted) {
                    return StreamEnd::Cancelled;
                }
                if !sink.send(ProducerEvent::Record(record)) {
                    return StreamEnd::Cancelled;
                }
                emitted += 1;
                if emitted >= limit {
                    return StreamEnd::LimitReached(emitted);
                }
            }
            Err(e @ LogError::Parse { .. }) => {
                if !sink.send(ProducerEvent::ParseError(e)) {
                    return StreamEnd::Cancelled;
                }
            }
            Err(e) => return StreamEnd::Failed(e),
        }
    }

    if gate.is_cancelled() {
        StreamEnd::Cancelled
    } else {
        StreamEnd::Exhausted(emitted)
    }
}

/// Run `body` on a named background thread
pub(crate) fn spawn_producer<F>(name: &str, body: F) -> Result<(), LogError>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map(|_| ())
        .map_err(|source| LogError::ProducerStart {
            program: name.to_string(),
            source,
        })
}
