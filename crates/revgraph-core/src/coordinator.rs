// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Refresh cycles
//!
//! A [`RefreshCoordinator`] owns the row source the rendering layer reads.
//! Each trigger starts a new cycle: the running producer is cancelled, the
//! generation is bumped and a fresh graph is built from the new stream.
//! Events from earlier generations are dropped on receipt, so a cancelled
//! producer can never leak rows into the current view.
//!
//! ```text
//! Idle -> Starting -> Streaming -> Completing -> Idle
//!                        |-> Cancelling -> Idle
//!                        |-> Failed -> Idle
//! ```

use std::sync::Arc;

use revgraph_log::{
    CommitId, CommitStreamProducer, EventReceiver, EventSender, EventSink, Generation, LogQuery,
    ProducerEvent, ProducerHandle, Tagged, event_channel,
};
use tracing::{debug, info, trace, warn};

use crate::error::{CoreError, GraphIntegrityWarning};
use crate::graph::{Integration, RowOrder};
use crate::notify::RowsChanged;
use crate::rows::{GrowthPolicy, VirtualizedRowSource};

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// No producer running
    Idle,
    /// A producer is being started
    Starting,
    /// Records are arriving
    Streaming,
    /// The stream ended and the view is being restored
    Completing,
    /// The running producer is being cancelled
    Cancelling,
    /// The stream failed
    Failed,
}

/// Why a refresh was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerReason {
    /// First load of the view
    InitialLoad,
    /// The user changed the filter or scope
    FilterChanged(LogQuery),
    /// The repository changed or the user asked for a reload
    ForcedRefresh,
}

/// View state captured when a cycle starts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewSnapshot {
    /// First visible row
    pub scroll_offset: usize,
    /// Number of visible rows
    pub viewport_rows: usize,
    /// Selected commits
    pub selected: Vec<CommitId>,
}

impl ViewSnapshot {
    /// Snapshot of a view scrolled to the top
    #[must_use]
    pub fn top(viewport_rows: usize) -> Self {
        Self {
            viewport_rows,
            ..Self::default()
        }
    }

    /// One past the last row needed to draw the captured window
    #[must_use]
    pub fn window_end(&self) -> usize {
        self.scroll_offset
            .saturating_add(self.viewport_rows)
            .saturating_add(1)
    }
}

/// View state re-applied to the new graph
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoredView {
    /// Scroll position, clamped to the rows that exist
    pub scroll_offset: usize,
    /// Previously selected commits still present
    pub selected: Vec<CommitId>,
    /// Rows of `selected`, in the same order
    pub selected_rows: Vec<usize>,
}

/// Counters for one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// The cycle
    pub generation: Generation,
    /// Records added to the graph
    pub integrated: usize,
    /// Records ignored as duplicates
    pub duplicates: usize,
    /// Malformed records the producer skipped
    pub parse_errors: usize,
    /// Events from older generations dropped during this cycle
    pub discarded_stale: usize,
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The stream ended normally
    Completed {
        /// Records the producer reported
        count: usize,
    },
    /// The stream failed; see [`RefreshCoordinator::error`]
    Failed,
    /// The producer stopped on its own cancellation
    Cancelled,
}

/// What one pump did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpOutcome {
    /// Records added to the graph
    pub integrated: usize,
    /// Stale events dropped
    pub discarded: usize,
    /// View restored during this pump
    pub restored: Option<RestoredView>,
    /// Set when the current cycle ended
    pub terminal: Option<CycleOutcome>,
}

/// Settings for a coordinator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Producer depth growth
    pub growth: GrowthPolicy,
    /// Row ordering
    pub order: RowOrder,
}

struct Cycle {
    generation: Generation,
    handle: ProducerHandle,
    /// Taken when the view is restored
    snapshot: Option<ViewSnapshot>,
    stats: CycleStats,
}

/// Runs refresh cycles and owns the current rows
pub struct RefreshCoordinator {
    producer: Arc<dyn CommitStreamProducer>,
    config: CoordinatorConfig,
    query: LogQuery,
    state: CoordinatorState,
    generation: Generation,
    tx: EventSender,
    rx: EventReceiver,
    rows: VirtualizedRowSource,
    retained: Option<VirtualizedRowSource>,
    cycle: Option<Cycle>,
    error: Option<CoreError>,
    last_stats: Option<CycleStats>,
    notifier: RowsChanged,
}

impl RefreshCoordinator {
    /// Idle coordinator for `producer`. Nothing is listed until
    /// [`Self::trigger`] is called.
    pub fn new(
        producer: Arc<dyn CommitStreamProducer>,
        query: LogQuery,
        config: CoordinatorConfig,
    ) -> Self {
        let (tx, rx) = event_channel();
        Self {
            producer,
            config,
            query,
            state: CoordinatorState::Idle,
            generation: Generation::default(),
            tx,
            rx,
            rows: VirtualizedRowSource::new(config.growth, config.order, 0, 0),
            retained: None,
            cycle: None,
            error: None,
            last_stats: None,
            notifier: RowsChanged::new(),
        }
    }

    /// Start a new cycle, cancelling any running one
    pub fn trigger(&mut self, reason: TriggerReason, snapshot: ViewSnapshot) -> Generation {
        if let TriggerReason::FilterChanged(query) = &reason {
            self.query = query.clone();
        }

        if let Some(cycle) = self.cycle.take() {
            self.transition(CoordinatorState::Cancelling);
            cycle.handle.cancel();
            self.last_stats = Some(cycle.stats);
            self.transition(CoordinatorState::Idle);
        }

        self.generation = self.generation.next();
        let generation = self.generation;
        info!(%generation, ?reason, "Refreshing history");

        let initial_depth = self.config.growth.initial_depth(&snapshot);
        let fresh = VirtualizedRowSource::new(
            self.config.growth,
            self.config.order,
            initial_depth,
            snapshot.window_end(),
        );
        let previous = std::mem::replace(&mut self.rows, fresh);
        if previous.row_count() > 0 {
            self.retained = Some(previous);
        }
        self.error = None;
        self.transition(CoordinatorState::Starting);
        self.notifier.signal();

        let sink = EventSink::new(generation, self.tx.clone());
        match self.producer.start(&self.query, initial_depth, sink) {
            Ok(handle) => {
                self.cycle = Some(Cycle {
                    generation,
                    handle,
                    snapshot: Some(snapshot),
                    stats: CycleStats {
                        generation,
                        ..CycleStats::default()
                    },
                });
                self.transition(CoordinatorState::Streaming);
            }
            Err(error) => {
                self.fail(CoreError::StartFailed(error));
            }
        }
        generation
    }

    /// Apply every event already queued, without waiting
    pub fn pump(&mut self) -> PumpOutcome {
        let mut outcome = PumpOutcome::default();
        while let Ok(tagged) = self.rx.try_recv() {
            self.handle(tagged, &mut outcome);
        }
        self.settle(&mut outcome);
        outcome
    }

    /// Wait for at least one event, then apply everything queued
    ///
    /// With no producer running nothing new can arrive, so this returns at
    /// once after applying whatever is already queued.
    pub async fn next_event(&mut self) -> PumpOutcome {
        if self.cycle.is_none() {
            return self.pump();
        }
        let mut outcome = PumpOutcome::default();
        if let Some(tagged) = self.rx.recv().await {
            self.handle(tagged, &mut outcome);
        }
        while let Ok(tagged) = self.rx.try_recv() {
            self.handle(tagged, &mut outcome);
        }
        self.settle(&mut outcome);
        outcome
    }

    /// Make sure at least `min_count` rows will be loaded. Returns true if a
    /// new depth was sent to the running producer.
    pub fn grow_to(&mut self, min_count: usize) -> bool {
        let Some(depth) = self.rows.grow_to(min_count) else {
            return false;
        };
        match &self.cycle {
            Some(cycle) => {
                debug!(generation = %cycle.generation, depth, "Requesting more history");
                cycle.handle.request_depth(depth)
            }
            None => false,
        }
    }

    /// Rows of the current view
    #[must_use]
    pub fn rows(&self) -> &VirtualizedRowSource {
        &self.rows
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// Generation of the latest cycle
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Query used by the latest cycle
    #[must_use]
    pub fn query(&self) -> &LogQuery {
        &self.query
    }

    /// Error of the latest cycle, if it failed
    #[must_use]
    pub fn error(&self) -> Option<&CoreError> {
        self.error.as_ref()
    }

    /// Take the error of the latest cycle
    pub fn take_error(&mut self) -> Option<CoreError> {
        self.error.take()
    }

    /// Whether a producer is running
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.cycle.is_some()
    }

    /// Depth granted to the running producer
    #[must_use]
    pub fn requested_depth(&self) -> Option<usize> {
        self.cycle.as_ref().map(|c| c.handle.requested_depth())
    }

    /// Counters of the running cycle, or of the last one that ended
    #[must_use]
    pub fn stats(&self) -> Option<CycleStats> {
        self.cycle.as_ref().map(|c| c.stats).or(self.last_stats)
    }

    /// Tolerated inconsistencies in the current graph
    #[must_use]
    pub fn integrity_warnings(&self) -> Vec<GraphIntegrityWarning> {
        self.rows.builder().integrity_warnings()
    }

    /// Notifier raised whenever rows change
    #[must_use]
    pub fn rows_changed(&self) -> RowsChanged {
        self.notifier.clone()
    }

    fn transition(&mut self, next: CoordinatorState) {
        trace!(from = ?self.state, to = ?next, generation = %self.generation, "State change");
        self.state = next;
    }

    fn handle(&mut self, tagged: Tagged, outcome: &mut PumpOutcome) {
        let Some(cycle) = self
            .cycle
            .as_mut()
            .filter(|c| c.generation == tagged.generation)
        else {
            trace!(
                stale = %tagged.generation,
                current = %self.generation,
                "Discarding stale event"
            );
            outcome.discarded += 1;
            if let Some(cycle) = self.cycle.as_mut() {
                cycle.stats.discarded_stale += 1;
            }
            return;
        };

        match tagged.event {
            ProducerEvent::Record(record) => match self.rows.integrate(record) {
                Integration::Inserted => {
                    cycle.stats.integrated += 1;
                    outcome.integrated += 1;
                }
                Integration::Duplicate => cycle.stats.duplicates += 1,
            },
            ProducerEvent::ParseError(error) => {
                warn!(generation = %cycle.generation, %error, "Skipped malformed record");
                cycle.stats.parse_errors += 1;
            }
            ProducerEvent::Completed { count } => {
                self.complete(outcome);
                outcome.terminal = Some(CycleOutcome::Completed { count });
            }
            ProducerEvent::Failed(error) => {
                self.fail(CoreError::ProducerFailed(error));
                outcome.terminal = Some(CycleOutcome::Failed);
            }
            ProducerEvent::Cancelled => {
                self.transition(CoordinatorState::Cancelling);
                if let Some(cycle) = self.cycle.take() {
                    self.last_stats = Some(cycle.stats);
                }
                self.transition(CoordinatorState::Idle);
                outcome.terminal = Some(CycleOutcome::Cancelled);
            }
        }
    }

    /// Assign rows to newly integrated records and restore the view once the
    /// captured window is covered
    fn settle(&mut self, outcome: &mut PumpOutcome) {
        if outcome.integrated > 0 {
            self.rows.settle();
            if self.rows.row_count() >= self.rows.granted_depth() {
                self.restore_view(outcome);
            }
        }
        if outcome.integrated > 0 || outcome.terminal.is_some() {
            self.notifier.signal();
        }
    }

    fn restore_view(&mut self, outcome: &mut PumpOutcome) {
        let Some(snapshot) = self.cycle.as_mut().and_then(|c| c.snapshot.take()) else {
            return;
        };
        let graph = self.rows.graph();
        let mut restored = RestoredView {
            scroll_offset: snapshot
                .scroll_offset
                .min(graph.row_count().saturating_sub(snapshot.viewport_rows.max(1))),
            ..RestoredView::default()
        };
        for id in snapshot.selected {
            if let Some(row) = graph.row_of(&id) {
                restored.selected.push(id);
                restored.selected_rows.push(row);
            }
        }
        debug!(
            generation = %self.generation,
            scroll_offset = restored.scroll_offset,
            selected = restored.selected.len(),
            "Restored view"
        );
        outcome.restored = Some(restored);
    }

    fn complete(&mut self, outcome: &mut PumpOutcome) {
        self.transition(CoordinatorState::Completing);
        self.rows.settle();
        self.restore_view(outcome);
        self.retained = None;
        if let Some(cycle) = self.cycle.take() {
            info!(
                generation = %cycle.generation,
                rows = self.rows.row_count(),
                duplicates = cycle.stats.duplicates,
                parse_errors = cycle.stats.parse_errors,
                boundaries = self.rows.graph().boundaries().count(),
                "History loaded"
            );
            self.last_stats = Some(cycle.stats);
        }
        self.transition(CoordinatorState::Idle);
    }

    fn fail(&mut self, error: CoreError) {
        self.transition(CoordinatorState::Failed);
        warn!(generation = %self.generation, %error, "History refresh failed");
        if let Some(cycle) = self.cycle.take() {
            self.last_stats = Some(cycle.stats);
        }
        match self.retained.take() {
            Some(previous) => {
                debug!(rows = previous.row_count(), "Keeping previous history");
                self.rows = previous;
            }
            None => {
                debug!("No previous history to keep");
                self.rows =
                    VirtualizedRowSource::new(self.config.growth, self.config.order, 0, 0);
            }
        }
        self.error = Some(error);
        self.transition(CoordinatorState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::record;
    use revgraph_log::{DemandGate, LogError};
    use similar_asserts::assert_eq;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Producer whose sinks are driven by the test
    #[derive(Default)]
    struct Manual {
        started: Mutex<Vec<(EventSink, DemandGate)>>,
        fail_start: Mutex<bool>,
    }

    impl Manual {
        fn sink(&self, index: usize) -> EventSink {
            self.started.lock().unwrap()[index].0.clone()
        }

        fn gate(&self, index: usize) -> DemandGate {
            self.started.lock().unwrap()[index].1.clone()
        }
    }

    impl CommitStreamProducer for Manual {
        fn start(
            &self,
            _query: &LogQuery,
            initial_depth: usize,
            sink: EventSink,
        ) -> Result<ProducerHandle, LogError> {
            if *self.fail_start.lock().unwrap() {
                return Err(LogError::RepositoryNotFound {
                    path: "/missing".to_string(),
                });
            }
            let gate = DemandGate::new(initial_depth);
            let handle = ProducerHandle::new(sink.generation(), gate.clone());
            self.started.lock().unwrap().push((sink, gate));
            Ok(handle)
        }
    }

    fn coordinator(page_size: usize) -> (Arc<Manual>, RefreshCoordinator) {
        let producer = Arc::new(Manual::default());
        let config = CoordinatorConfig {
            growth: GrowthPolicy::with_page_size(page_size),
            order: RowOrder::Arrival,
        };
        let coordinator =
            RefreshCoordinator::new(producer.clone(), LogQuery::default(), config);
        (producer, coordinator)
    }

    fn send_history(sink: &EventSink) {
        for r in [
            record("D", &["B", "C"], 4),
            record("B", &["A"], 2),
            record("C", &["A"], 3),
            record("A", &[], 1),
        ] {
            sink.send(ProducerEvent::Record(r));
        }
        sink.send(ProducerEvent::Completed { count: 4 });
    }

    #[test]
    fn test_initial_load_completes() {
        let (producer, mut coordinator) = coordinator(10);
        let generation = coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        assert_eq!(generation, Generation(1));
        assert_eq!(coordinator.state(), CoordinatorState::Streaming);

        send_history(&producer.sink(0));
        let outcome = coordinator.pump();
        assert_eq!(outcome.integrated, 4);
        assert_eq!(outcome.terminal, Some(CycleOutcome::Completed { count: 4 }));
        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert_eq!(coordinator.rows().row_count(), 4);
        assert!(coordinator.rows_changed().take_pending());
        assert_eq!(
            coordinator.stats().map(|s| s.integrated),
            Some(4)
        );
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let (producer, mut coordinator) = coordinator(10);
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        let old = producer.sink(0);
        coordinator.trigger(TriggerReason::ForcedRefresh, ViewSnapshot::top(5));
        assert!(producer.gate(0).is_cancelled());

        old.send(ProducerEvent::Record(record("OLD", &[], 1)));
        old.send(ProducerEvent::Cancelled);
        producer
            .sink(1)
            .send(ProducerEvent::Record(record("NEW", &[], 2)));

        let outcome = coordinator.pump();
        assert_eq!(outcome.discarded, 2);
        assert_eq!(outcome.integrated, 1);
        assert_eq!(outcome.terminal, None);
        assert!(!coordinator.rows().graph().contains(&CommitId::new("OLD")));
        assert_eq!(coordinator.stats().map(|s| s.discarded_stale), Some(2));
        assert!(coordinator.is_streaming());
    }

    #[test]
    fn test_failed_cycle_keeps_previous_graph() {
        let (producer, mut coordinator) = coordinator(10);
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        send_history(&producer.sink(0));
        coordinator.pump();

        coordinator.trigger(TriggerReason::ForcedRefresh, ViewSnapshot::top(5));
        assert_eq!(coordinator.rows().row_count(), 0);
        let sink = producer.sink(1);
        sink.send(ProducerEvent::Record(record("E", &["D"], 5)));
        sink.send(ProducerEvent::Failed(LogError::Parse {
            message: "broken pipe".to_string(),
        }));

        let outcome = coordinator.pump();
        assert_eq!(outcome.terminal, Some(CycleOutcome::Failed));
        assert_eq!(coordinator.rows().row_count(), 4);
        assert!(!coordinator.rows().graph().contains(&CommitId::new("E")));
        assert!(matches!(
            coordinator.error(),
            Some(CoreError::ProducerFailed(_))
        ));
    }

    #[test]
    fn test_failed_first_load_leaves_empty_view() {
        let (producer, mut coordinator) = coordinator(10);
        *producer.fail_start.lock().unwrap() = true;
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));

        assert_eq!(coordinator.state(), CoordinatorState::Idle);
        assert!(!coordinator.is_streaming());
        assert_eq!(coordinator.rows().row_count(), 0);
        assert!(matches!(coordinator.error(), Some(CoreError::StartFailed(_))));
    }

    #[test]
    fn test_failed_first_load_drops_partial_rows() {
        let (producer, mut coordinator) = coordinator(10);
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        let sink = producer.sink(0);
        sink.send(ProducerEvent::Record(record("X", &[], 1)));
        sink.send(ProducerEvent::Failed(LogError::ProcessExit {
            status: "exit status: 128".to_string(),
            stderr: "fatal: bad object".to_string(),
        }));

        let outcome = coordinator.pump();
        assert_eq!(outcome.terminal, Some(CycleOutcome::Failed));
        assert_eq!(coordinator.rows().row_count(), 0);
        assert!(!coordinator.rows().graph().contains(&CommitId::new("X")));
        assert!(matches!(
            coordinator.error(),
            Some(CoreError::ProducerFailed(LogError::ProcessExit { .. }))
        ));
    }

    #[tokio::test]
    async fn test_next_event_returns_when_idle() {
        let (producer, mut coordinator) = coordinator(10);
        let outcome = tokio::time::timeout(Duration::from_secs(5), coordinator.next_event())
            .await
            .expect("idle coordinator should not wait");
        assert_eq!(outcome, PumpOutcome::default());

        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        send_history(&producer.sink(0));
        let outcome = coordinator.next_event().await;
        assert_eq!(outcome.terminal, Some(CycleOutcome::Completed { count: 4 }));
        assert!(!coordinator.is_streaming());

        let outcome = tokio::time::timeout(Duration::from_secs(5), coordinator.next_event())
            .await
            .expect("finished cycle should not wait");
        assert_eq!(outcome.integrated, 0);
        assert_eq!(outcome.terminal, None);
    }

    #[test]
    fn test_selection_restored_by_id() {
        let (producer, mut coordinator) = coordinator(10);
        let snapshot = ViewSnapshot {
            scroll_offset: 50,
            viewport_rows: 2,
            selected: vec![CommitId::new("C"), CommitId::new("GONE"), CommitId::new("A")],
        };
        coordinator.trigger(TriggerReason::ForcedRefresh, snapshot);
        send_history(&producer.sink(0));

        let restored = coordinator.pump().restored.expect("view restored");
        assert_eq!(restored.selected, vec![CommitId::new("C"), CommitId::new("A")]);
        assert_eq!(restored.selected_rows, vec![2, 3]);
        assert_eq!(restored.scroll_offset, 2);
    }

    #[test]
    fn test_view_restored_once_window_is_covered() {
        let (producer, mut coordinator) = coordinator(2);
        coordinator.trigger(
            TriggerReason::InitialLoad,
            ViewSnapshot {
                scroll_offset: 0,
                viewport_rows: 1,
                selected: vec![CommitId::new("B")],
            },
        );
        let sink = producer.sink(0);
        sink.send(ProducerEvent::Record(record("D", &["B", "C"], 4)));
        assert_eq!(coordinator.pump().restored, None);

        sink.send(ProducerEvent::Record(record("B", &["A"], 2)));
        let restored = coordinator.pump().restored.expect("window covered");
        assert_eq!(restored.selected_rows, vec![1]);

        send_history(&sink);
        assert_eq!(coordinator.pump().restored, None);
    }

    #[test]
    fn test_grow_forwards_depth_once() {
        let (producer, mut coordinator) = coordinator(2);
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(1));
        assert_eq!(coordinator.requested_depth(), Some(2));

        assert!(coordinator.grow_to(5));
        assert!(!coordinator.grow_to(5));
        assert_eq!(producer.gate(0).depth(), 5);
    }

    #[test]
    fn test_filter_change_replaces_query() {
        let (_producer, mut coordinator) = coordinator(10);
        let query = LogQuery::all_refs().with_limit(3);
        coordinator.trigger(TriggerReason::FilterChanged(query.clone()), ViewSnapshot::top(5));
        assert_eq!(coordinator.query(), &query);
        coordinator.trigger(TriggerReason::ForcedRefresh, ViewSnapshot::top(5));
        assert_eq!(coordinator.query(), &query);
        assert_eq!(coordinator.generation(), Generation(2));
    }

    #[test]
    fn test_burst_raises_one_notification() {
        let (producer, mut coordinator) = coordinator(1000);
        coordinator.trigger(TriggerReason::InitialLoad, ViewSnapshot::top(5));
        let changed = coordinator.rows_changed();
        assert!(changed.take_pending());

        let sink = producer.sink(0);
        for i in 0..100 {
            sink.send(ProducerEvent::Record(record(&format!("c{i}"), &[], i)));
        }
        assert_eq!(coordinator.pump().integrated, 100);
        assert!(changed.take_pending());
        assert!(!changed.take_pending());
    }
}
