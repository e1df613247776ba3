use crate::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;

#[derive(Clone, Debug, PartialEq)]
struct Cell {
    id: u64,
    slot: Slot,
    position: Option<Point>,
    size: Size,
}

struct MockSurface {
    next_id: u64,
    created: usize,
    destroyed: usize,
    rebound: usize,
    width: f64,
    height: fn(Slot) -> f64,
}

impl MockSurface {
    fn new(height: fn(Slot) -> f64) -> Self {
        Self {
            next_id: 0,
            created: 0,
            destroyed: 0,
            rebound: 0,
            width: 50.0,
            height,
        }
    }

    fn live(&self) -> usize {
        self.created - self.destroyed
    }
}

impl RenderSurface<u32> for MockSurface {
    type Handle = Cell;

    fn create_handle(&mut self, slot: Slot, _item: Option<&u32>) -> Cell {
        self.created += 1;
        self.next_id += 1;
        Cell {
            id: self.next_id,
            slot,
            position: None,
            size: Size::ZERO,
        }
    }

    fn destroy_handle(&mut self, _handle: Cell) {
        self.destroyed += 1;
    }

    fn rebind_handle(&mut self, mut handle: Cell, slot: Slot, _item: Option<&u32>) -> Cell {
        self.rebound += 1;
        handle.slot = slot;
        handle.position = None;
        handle
    }

    fn measure(&mut self, handle: &Cell, _constraint: Size) -> Size {
        Size::new(self.width, (self.height)(handle.slot))
    }

    fn arrange(&mut self, handle: &mut Cell, position: Point, size: Size) {
        handle.position = Some(position);
        handle.size = size;
    }
}

/// A source whose fetches stay in flight until the test resolves them.
#[derive(Debug, Default)]
struct PendingSource {
    items: Vec<u32>,
    fetches: usize,
    pending: Option<FetchCompleter<u32>>,
}

impl PendingSource {
    fn with_items(n: u32) -> Self {
        Self {
            items: (0..n).collect(),
            ..Self::default()
        }
    }

    fn take_completer(&mut self) -> FetchCompleter<u32> {
        self.pending.take().expect("no fetch in flight")
    }
}

impl DataSource for PendingSource {
    type Item = u32;

    fn item_count(&self) -> usize {
        self.items.len()
    }

    fn item_at(&self, index: usize) -> Option<&u32> {
        self.items.get(index)
    }

    fn fetch_more(&mut self, completer: FetchCompleter<u32>) {
        self.fetches += 1;
        self.pending = Some(completer);
    }

    fn append(&mut self, items: Vec<u32>) {
        self.items.extend(items);
    }
}

fn twenty(_: Slot) -> f64 {
    20.0
}

fn ten(_: Slot) -> f64 {
    10.0
}

fn zero(_: Slot) -> f64 {
    0.0
}

fn tall_head(slot: Slot) -> f64 {
    match slot {
        Slot::Item(i) if i < 5 => 40.0,
        _ => 10.0,
    }
}

fn uniform_engine(n: u32, viewport_height: f64) -> Engine<MockSurface, PendingSource> {
    let options =
        EngineOptions::uniform(20.0).with_initial_viewport(Some(Size::new(200.0, viewport_height)));
    Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(n))
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn realized_slots<S, D>(engine: &Engine<S, D>) -> Vec<Slot>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    engine.realized().map(|(slot, _)| slot).collect()
}

fn items(range: core::ops::Range<usize>) -> Vec<Slot> {
    range.map(Slot::Item).collect()
}

#[test]
fn uniform_window_at_origin_covers_viewport_plus_slack() {
    let mut engine = uniform_engine(50, 100.0);
    let report = engine.run_pass();

    assert_eq!(report.window.range, IndexRange::new(0, 6));
    assert!(!report.window.includes_sentinel());
    assert!(report.covered);
    assert_eq!(report.attempts, 1);
    assert_eq!(engine.extent(), Size::new(50.0, 1000.0));
    assert_eq!(realized_slots(&engine), items(0..6));
    assert_eq!(engine.source().fetches, 0);
}

#[test]
fn scrolled_window_keeps_in_range_offset() {
    let mut engine = uniform_engine(50, 100.0);
    assert_eq!(engine.set_offset(Axis::Vertical, 205.0), 205.0);

    let report = engine.run_pass();
    assert_eq!(report.window.range, IndexRange::new(10, 16));
    assert_eq!(engine.offset().y, 205.0);
    assert_eq!(engine.extent().height, 1000.0);
}

#[test]
fn arrange_stacks_handles_from_leading_edge() {
    let mut engine = uniform_engine(50, 100.0);
    engine.set_offset(Axis::Vertical, 205.0);
    engine.run_pass();

    let first = engine.handle(Slot::Item(10)).unwrap();
    assert_eq!(first.position, Some(Point::new(0.0, -5.0)));
    assert_eq!(first.size, Size::new(200.0, 20.0));
    let second = engine.handle(Slot::Item(11)).unwrap();
    assert_eq!(second.position, Some(Point::new(0.0, 15.0)));
}

#[test]
fn offset_past_extent_is_clamped() {
    let calls = counter();
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 100.0)))
        .with_on_invalidate(Some({
            let calls = Arc::clone(&calls);
            move |_: ScrollInfo| {
                calls.fetch_add(1, Ordering::Relaxed);
            }
        }));
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(50));

    assert_eq!(engine.set_offset(Axis::Vertical, 100.0), 100.0);
    assert_eq!(calls.load(Ordering::Relaxed), 0);

    assert_eq!(engine.set_offset(Axis::Vertical, 950.0), 900.0);
    assert_eq!(engine.offset().y, 900.0);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn sentinel_in_window_fires_exactly_one_fetch() {
    let states = Arc::new(std::sync::Mutex::new(Vec::new()));
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 20.0)))
        .with_on_load_state(Some({
            let states = Arc::clone(&states);
            move |state: &LoadState| states.lock().unwrap().push(state.clone())
        }));
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(10));
    engine.set_offset(Axis::Vertical, 180.0);

    let report = engine.run_pass();
    assert_eq!(report.window.range, IndexRange::new(9, 11));
    assert!(report.window.includes_sentinel());
    assert!(report.fetch_dispatched);
    assert_eq!(engine.source().fetches, 1);
    assert_eq!(engine.load_state(), &LoadState::Loading);
    assert_eq!(engine.extent().height, 220.0);

    let again = engine.run_pass();
    assert!(again.window.includes_sentinel());
    assert!(!again.fetch_dispatched);
    assert_eq!(engine.source().fetches, 1);
    assert_eq!(*states.lock().unwrap(), vec![LoadState::Loading]);
}

#[test]
fn completed_batch_removes_sentinel_for_good() {
    let mut engine = uniform_engine(10, 20.0);
    engine.set_offset(Axis::Vertical, 180.0);
    engine.run_pass();
    assert!(engine.handle(Slot::Sentinel).is_some());

    let completer = engine.source_mut().take_completer();
    assert!(completer.complete(Batch::last(Vec::new())));
    assert!(engine.needs_pass());

    let report = engine.run_pass();
    assert_eq!(engine.load_state(), &LoadState::Completed);
    assert!(!report.window.sentinel);
    assert_eq!(report.window.range, IndexRange::new(9, 10));
    assert!(engine.handle(Slot::Sentinel).is_none());
    assert_eq!(engine.extent().height, 200.0);
    assert_eq!(engine.offset().y, 180.0);

    for y in [0.0, 90.0, 180.0, 10_000.0] {
        engine.set_offset(Axis::Vertical, y);
        let report = engine.run_pass();
        assert!(!report.window.includes_sentinel());
        assert!(!report.fetch_dispatched);
    }
    assert_eq!(engine.source().fetches, 1);
}

#[test]
fn delivered_items_extend_the_sequence() {
    let mut engine = uniform_engine(10, 20.0);
    engine.set_offset(Axis::Vertical, 180.0);
    engine.run_pass();

    let completer = engine.source_mut().take_completer();
    completer.complete(Batch::more(vec![10, 11, 12]));
    engine.run_pass();

    assert_eq!(engine.item_count(), 13);
    assert_eq!(engine.load_state(), &LoadState::Idle);
    assert_eq!(engine.extent().height, 260.0);
    // Scrolling to the new tail reaches the sentinel again.
    engine.set_offset(Axis::Vertical, 240.0);
    let report = engine.run_pass();
    assert!(report.window.includes_sentinel());
    assert!(report.fetch_dispatched);
    assert_eq!(engine.source().fetches, 2);
}

#[test]
fn zero_slack_loads_once_the_last_item_is_in_range() {
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 100.0)))
        .with_viewport_slack(0);
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(10));

    engine.set_offset(Axis::Vertical, 1e9);
    engine.page_step(Axis::Vertical, ScrollDirection::Forward);
    engine.settle(10);
    assert_eq!(engine.offset().y, 100.0);
    assert_eq!(engine.extent().height, 200.0);
    assert_eq!(engine.window().range, IndexRange::new(5, 10));
    assert!(!engine.window().includes_sentinel());
    assert_eq!(engine.source().fetches, 1);
    assert_eq!(engine.load_state(), &LoadState::Loading);

    let completer = engine.source_mut().take_completer();
    completer.complete(Batch::more(vec![10, 11, 12, 13, 14]));
    engine.settle(10);
    assert_eq!(engine.item_count(), 15);
    assert_eq!(engine.load_state(), &LoadState::Idle);
    assert_eq!(engine.source().fetches, 1);

    engine.set_offset(Axis::Vertical, 1e9);
    engine.settle(10);
    assert_eq!(engine.offset().y, 200.0);
    assert_eq!(engine.window().range, IndexRange::new(10, 15));
    assert_eq!(engine.source().fetches, 2);
}

#[test]
fn vec_source_completes_on_first_fetch() {
    let options =
        EngineOptions::uniform(10.0).with_initial_viewport(Some(Size::new(100.0, 100.0)));
    let mut engine = Engine::new(options, MockSurface::new(ten), vec![1u32, 2, 3]);

    let report = engine.run_pass();
    assert_eq!(report.window.range, IndexRange::new(0, 4));
    assert!(report.fetch_dispatched);
    assert!(engine.needs_pass());

    let report = engine.run_pass();
    assert_eq!(engine.load_state(), &LoadState::Completed);
    assert_eq!(report.window.range, IndexRange::new(0, 3));
    assert!(report.covered);
    assert_eq!(engine.extent().height, 30.0);
    assert_eq!(engine.surface().live(), 3);
}

#[test]
fn estimated_heights_bootstrap_from_one_measurement() {
    let options = EngineOptions::estimated().with_initial_viewport(Some(Size::new(200.0, 100.0)));
    let mut engine = Engine::new(options, MockSurface::new(ten), PendingSource::with_items(100));
    assert_eq!(engine.extent().height, 0.0);

    let report = engine.run_pass();
    assert_eq!(report.attempts, 2);
    assert!(report.covered);
    assert_eq!(report.window.range, IndexRange::new(0, 11));
    assert_eq!(engine.estimator().estimate(), Some(10.0));
    assert_eq!(engine.extent().height, 1000.0);
}

#[test]
fn zero_height_items_stop_at_remeasure_cap() {
    let options = EngineOptions::estimated()
        .with_initial_viewport(Some(Size::new(200.0, 50.0)))
        .with_max_remeasure_passes(3);
    let mut engine = Engine::new(options, MockSurface::new(zero), PendingSource::with_items(1000));

    let report = engine.run_pass();
    assert!(!report.covered);
    // One bootstrap attempt plus the capped ones.
    assert_eq!(report.attempts, 4);
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(engine.extent().height, 0.0);
}

#[test]
fn overestimated_tail_pulls_offset_back() {
    let options = EngineOptions::estimated()
        .with_initial_viewport(Some(Size::new(200.0, 100.0)))
        .with_max_remeasure_passes(8);
    let mut engine = Engine::new(options, MockSurface::new(tall_head), PendingSource::with_items(10));
    engine.run_pass();
    assert_eq!(engine.extent().height, 400.0);

    assert!(engine.request_load());
    engine
        .source_mut()
        .take_completer()
        .complete(Batch::last(Vec::new()));
    engine.run_pass();
    assert_eq!(engine.set_offset(Axis::Vertical, 300.0), 300.0);

    // The short tail shrinks the estimate until the window runs out of items.
    let report = engine.run_pass();
    assert!(report.covered);
    assert_eq!(engine.extent().height, 250.0);
    assert_eq!(report.offset.y, 90.0);
    assert_eq!(report.window.range, IndexRange::new(3, 9));
}

#[test]
fn fetch_error_surfaces_and_retry_dispatches_again() {
    let mut engine = uniform_engine(10, 20.0);
    engine.set_offset(Axis::Vertical, 180.0);
    engine.run_pass();

    engine.source_mut().take_completer().fail("boom");
    engine.run_pass();
    assert_eq!(engine.load_state(), &LoadState::Errored("boom".to_string()));
    assert_eq!(engine.item_count(), 10);

    let report = engine.run_pass();
    assert!(!report.fetch_dispatched);
    assert_eq!(engine.source().fetches, 1);

    assert!(engine.retry_load());
    assert_eq!(engine.load_state(), &LoadState::Loading);
    assert_eq!(engine.source().fetches, 2);
    assert!(!engine.retry_load());
}

#[test]
fn dropped_completer_reports_cancellation() {
    let wakes = counter();
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 20.0)))
        .with_on_wake(Some({
            let wakes = Arc::clone(&wakes);
            move || {
                wakes.fetch_add(1, Ordering::Relaxed);
            }
        }));
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(10));
    engine.set_offset(Axis::Vertical, 180.0);
    engine.run_pass();

    drop(engine.source_mut().take_completer());
    assert_eq!(wakes.load(Ordering::Relaxed), 1);
    assert!(engine.needs_pass());

    engine.run_pass();
    assert_eq!(
        engine.load_state(),
        &LoadState::Errored(FetchError::Cancelled.to_string())
    );
}

#[test]
fn completion_after_teardown_is_a_no_op() {
    let mut engine = uniform_engine(10, 20.0);
    engine.set_offset(Axis::Vertical, 180.0);
    engine.run_pass();
    let live = engine.surface().live();
    assert_eq!(live, 2);

    let (surface, mut source) = engine.teardown();
    assert_eq!(surface.live(), 0);

    let completer = source.take_completer();
    assert!(!completer.is_live());
    assert!(!completer.complete(Batch::more(vec![99])));
    assert_eq!(source.items.len(), 10);
}

#[test]
fn completer_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<FetchCompleter<u32>>();
}

#[test]
fn host_requested_load_dispatches_immediately() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();
    assert!(engine.request_load());
    assert_eq!(engine.source().fetches, 1);
    assert!(!engine.request_load());

    let report = engine.run_pass();
    assert!(!report.fetch_dispatched);
    assert_eq!(engine.source().fetches, 1);
}

#[test]
fn pool_rebinds_recycled_handles() {
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 100.0)))
        .with_pool_capacity(4);
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(50));
    engine.run_pass();
    assert_eq!(engine.surface().created, 6);

    engine.set_offset(Axis::Vertical, 400.0);
    let report = engine.run_pass();
    assert_eq!(report.window.range, IndexRange::new(20, 26));

    let surface = engine.surface();
    assert_eq!(surface.rebound, 4);
    assert_eq!(surface.created, 8);
    assert_eq!(surface.destroyed, 2);
    assert_eq!(engine.pooled_handles(), 0);

    let (surface, _) = engine.teardown();
    assert_eq!(surface.live(), 0);
}

#[test]
fn recycle_then_realize_round_trip_is_stable() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();
    let before: Vec<u64> = engine.realized().map(|(_, cell)| cell.id).collect();

    // A second pass over the same geometry must not touch any handle.
    engine.request_remeasure();
    engine.run_pass();
    let after: Vec<u64> = engine.realized().map(|(_, cell)| cell.id).collect();
    assert_eq!(before, after);
    assert_eq!(engine.surface().created, 6);
    assert_eq!(engine.surface().destroyed, 0);
}

#[test]
fn inserted_items_shift_realized_handles() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();
    let first_id = engine.handle(Slot::Item(0)).unwrap().id;

    engine.source_mut().items.splice(0..0, [100, 101]);
    engine.items_changed(ItemsChange::Inserted { index: 0, count: 2 });
    assert_eq!(realized_slots(&engine), items(2..8));
    assert_eq!(engine.handle(Slot::Item(2)).unwrap().id, first_id);

    engine.run_pass();
    assert_eq!(realized_slots(&engine), items(0..6));
    assert_eq!(engine.surface().created, 8);
    assert_eq!(engine.surface().destroyed, 2);
    assert_eq!(engine.extent().height, 1040.0);
}

#[test]
fn removed_and_replaced_items_recycle_their_handles() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();
    let third_id = engine.handle(Slot::Item(2)).unwrap().id;

    engine.source_mut().items.remove(1);
    engine.items_changed(ItemsChange::Removed { index: 1, count: 1 });
    assert_eq!(engine.surface().destroyed, 1);
    assert_eq!(engine.handle(Slot::Item(1)).unwrap().id, third_id);

    engine.items_changed(ItemsChange::Replaced { index: 0, count: 1 });
    assert_eq!(engine.surface().destroyed, 2);
    assert!(engine.handle(Slot::Item(0)).is_none());

    engine.run_pass();
    assert_eq!(realized_slots(&engine), items(0..6));
}

#[test]
fn moved_item_keeps_neighbours_in_order() {
    let change = ItemsChange::Moved { from: 1, to: 3 };
    assert_eq!(change.remap(Slot::Item(0)), Some(Slot::Item(0)));
    assert_eq!(change.remap(Slot::Item(1)), None);
    assert_eq!(change.remap(Slot::Item(2)), Some(Slot::Item(1)));
    assert_eq!(change.remap(Slot::Item(3)), Some(Slot::Item(2)));
    assert_eq!(change.remap(Slot::Item(4)), Some(Slot::Item(4)));
    assert_eq!(change.remap(Slot::Sentinel), Some(Slot::Sentinel));

    let back = ItemsChange::Moved { from: 3, to: 1 };
    assert_eq!(back.remap(Slot::Item(1)), Some(Slot::Item(2)));
    assert_eq!(back.remap(Slot::Item(3)), None);
    assert_eq!(ItemsChange::Reset.remap(Slot::Item(0)), None);
}

#[test]
fn reset_drops_every_handle_and_sample() {
    let options = EngineOptions::estimated().with_initial_viewport(Some(Size::new(200.0, 100.0)));
    let mut engine = Engine::new(options, MockSurface::new(ten), PendingSource::with_items(100));
    engine.run_pass();
    assert!(engine.estimator().has_samples());

    engine.items_changed(ItemsChange::Reset);
    assert_eq!(engine.realized().count(), 0);
    assert!(!engine.estimator().has_samples());

    let report = engine.run_pass();
    assert_eq!(report.attempts, 2);
}

#[test]
fn line_page_and_wheel_steps() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();

    assert_eq!(engine.line_step(Axis::Vertical, ScrollDirection::Forward), 20.0);
    assert_eq!(engine.wheel_step(Axis::Vertical, ScrollDirection::Forward), 80.0);
    assert_eq!(engine.page_step(Axis::Vertical, ScrollDirection::Forward), 180.0);
    assert_eq!(engine.page_step(Axis::Vertical, ScrollDirection::Backward), 80.0);
    assert_eq!(engine.line_step(Axis::Vertical, ScrollDirection::Backward), 60.0);
    // Content is narrower than the viewport: nothing to scroll horizontally.
    assert_eq!(engine.line_step(Axis::Horizontal, ScrollDirection::Forward), 0.0);
}

#[test]
fn horizontal_steps_use_cross_line_step() {
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(40.0, 100.0)))
        .with_cross_line_step(8.0);
    let mut surface = MockSurface::new(twenty);
    surface.width = 100.0;
    let mut engine = Engine::new(options, surface, PendingSource::with_items(50));
    engine.run_pass();

    assert_eq!(engine.max_offset().x, 60.0);
    assert_eq!(engine.line_step(Axis::Horizontal, ScrollDirection::Forward), 8.0);
    assert_eq!(engine.page_step(Axis::Horizontal, ScrollDirection::Forward), 48.0);
    assert_eq!(engine.page_step(Axis::Horizontal, ScrollDirection::Forward), 60.0);

    engine.run_pass();
    let cell = engine.handle(Slot::Item(0)).unwrap();
    assert_eq!(cell.position, Some(Point::new(-60.0, 0.0)));
}

#[test]
fn scroll_to_index_offset_alignments() {
    let mut engine = uniform_engine(50, 100.0);
    engine.run_pass();

    assert_eq!(engine.scroll_to_index_offset(10, Align::Start), 200.0);
    assert_eq!(engine.scroll_to_index_offset(10, Align::End), 120.0);
    assert_eq!(engine.scroll_to_index_offset(10, Align::Center), 160.0);
    assert_eq!(engine.scroll_to_index_offset(10, Align::Auto), 120.0);
    assert_eq!(engine.scroll_to_index_offset(49, Align::Start), 900.0);
    assert_eq!(engine.scroll_to_index_offset(500, Align::Start), 900.0);

    assert_eq!(engine.scroll_into_view(2), 0.0);
    assert_eq!(engine.scroll_into_view(10), 120.0);
    assert_eq!(engine.scroll_into_view(3), 60.0);
}

#[test]
fn invalid_geometry_is_sanitized() {
    let mut engine = uniform_engine(50, 100.0);
    engine.set_offset(Axis::Vertical, 40.0);

    assert_eq!(engine.set_offset(Axis::Vertical, f64::NAN), 40.0);
    assert_eq!(engine.set_offset(Axis::Vertical, f64::INFINITY), 40.0);
    assert_eq!(engine.set_offset(Axis::Vertical, -10.0), 0.0);

    assert!(engine.set_viewport(Size::new(f64::NAN, -5.0)));
    assert_eq!(engine.viewport(), Size::ZERO);
    assert!(!engine.set_viewport(Size::new(-1.0, f64::INFINITY)));
}

#[test]
fn pass_notifications_are_coalesced() {
    let calls = counter();
    let options = EngineOptions::uniform(20.0)
        .with_initial_viewport(Some(Size::new(200.0, 100.0)))
        .with_on_invalidate(Some({
            let calls = Arc::clone(&calls);
            move |_: ScrollInfo| {
                calls.fetch_add(1, Ordering::Relaxed);
            }
        }));
    let mut engine = Engine::new(options, MockSurface::new(twenty), PendingSource::with_items(50));
    engine.set_offset(Axis::Vertical, 900.0);

    // Shrinking the content clamps the offset and changes the extent in one pass.
    engine.source_mut().items.truncate(10);
    engine.items_changed(ItemsChange::Removed {
        index: 10,
        count: 40,
    });
    engine.run_pass();
    // The sentinel is realized at the new tail.
    assert_eq!(engine.offset().y, 120.0);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
}

#[test]
fn settle_runs_until_idle() {
    let options =
        EngineOptions::uniform(10.0).with_initial_viewport(Some(Size::new(100.0, 100.0)));
    let mut engine = Engine::new(options, MockSurface::new(ten), vec![1u32, 2, 3]);
    assert_eq!(engine.settle(8), 2);
    assert!(!engine.needs_pass());
    assert_eq!(engine.load_state(), &LoadState::Completed);
}

#[test]
fn estimator_keeps_one_sample_per_index() {
    let mut est = ExtentEstimator::new(HeightStrategy::Estimated);
    assert_eq!(est.estimate(), None);
    assert_eq!(est.total_extent(10), 0.0);

    est.record_measurement(0, 10.0);
    est.record_measurement(1, 30.0);
    assert_eq!(est.estimate(), Some(20.0));

    est.record_measurement(1, 10.0);
    assert_eq!(est.sample_count(), 2);
    assert_eq!(est.estimate(), Some(10.0));

    est.record_measurement(2, f64::NAN);
    assert_eq!(est.sample_count(), 3);
    assert!((est.estimate().unwrap() - 20.0 / 3.0).abs() < 1e-9);

    est.remove(2, 1);
    assert_eq!(est.estimate(), Some(10.0));
    est.insert(0, 3);
    est.invalidate(3, 1);
    assert_eq!(est.sample_count(), 1);
    assert_eq!(est.estimate(), Some(10.0));
}

#[test]
fn estimator_samples_stay_sparse_deep_in_the_list() {
    let mut est = ExtentEstimator::new(HeightStrategy::Estimated);
    est.record_measurement(50_000_000, 30.0);
    est.record_measurement(3, 10.0);
    assert_eq!(est.sample_count(), 2);
    assert_eq!(est.estimate(), Some(20.0));
    assert_eq!(est.total_extent(50_000_001), 1_000_000_020.0);

    // Shifted samples keep their values and can still be replaced at the new index.
    est.insert(10, 5);
    est.record_measurement(50_000_005, 50.0);
    assert_eq!(est.sample_count(), 2);
    assert_eq!(est.estimate(), Some(30.0));

    est.remove(0, 4);
    est.invalidate(50_000_001, 1);
    assert_eq!(est.sample_count(), 0);
    assert_eq!(est.estimate(), None);
}

#[test]
fn uniform_estimator_ignores_measurements() {
    let mut est = ExtentEstimator::new(HeightStrategy::Uniform(-4.0));
    assert_eq!(est.estimate(), Some(0.0));
    est.record_measurement(0, 10.0);
    assert_eq!(est.sample_count(), 0);

    let est = ExtentEstimator::new(HeightStrategy::Uniform(20.0));
    assert_eq!(est.total_extent(50), 1000.0);
}

#[test]
fn compute_range_bootstraps_and_caps() {
    let est = ExtentEstimator::new(HeightStrategy::Estimated);
    let w = compute_range(Point::ORIGIN, Size::new(0.0, 100.0), 10, true, &est, 1);
    assert_eq!(w.range, IndexRange::new(0, 1));

    let w = compute_range(Point::ORIGIN, Size::new(0.0, 100.0), 0, false, &est, 1);
    assert!(w.range.is_empty());

    let est = ExtentEstimator::new(HeightStrategy::Uniform(20.0));
    let w = compute_range(Point::new(0.0, 5000.0), Size::new(0.0, 100.0), 10, true, &est, 1);
    assert_eq!(w.range, IndexRange::new(10, 11));
    assert_eq!(w.slots().collect::<Vec<_>>(), vec![Slot::Sentinel]);
}

#[test]
fn trigger_fires_only_from_idle() {
    let mut trigger = LoadTrigger::new();
    let probe = SentinelProbe::new(90.0, 100.0);

    assert!(!trigger.evaluate_visibility(VisibilityEvent::Scrolled { vertical_delta: 0.0 }, probe));
    assert!(!trigger.evaluate_visibility(
        VisibilityEvent::Layout,
        SentinelProbe::new(100.0, 100.0)
    ));
    assert!(trigger.evaluate_visibility(VisibilityEvent::Scrolled { vertical_delta: 3.0 }, probe));
    assert!(!trigger.evaluate_visibility(VisibilityEvent::Layout, probe));

    assert!(trigger.on_error("offline"));
    assert!(!trigger.fire());
    assert!(trigger.retry());
    assert!(trigger.fire());
    assert!(trigger.on_batch(true));
    assert!(!trigger.fire());
    assert!(!trigger.retry());
    assert_eq!(trigger.state(), &LoadState::Completed);
}

fn window(first: usize, last: usize, item_count: usize, sentinel: bool) -> Window {
    Window {
        range: IndexRange::new(first, last),
        item_count,
        sentinel,
    }
}

#[test]
fn window_trigger_fires_at_the_last_item() {
    let mut trigger = LoadTrigger::new();
    assert!(!trigger.evaluate_window(&window(4, 9, 10, true)));
    assert!(!trigger.evaluate_window(&window(5, 10, 10, false)));
    assert!(trigger.evaluate_window(&window(5, 10, 10, true)));
    assert!(!trigger.evaluate_window(&window(5, 11, 10, true)));
    assert_eq!(trigger.state(), &LoadState::Loading);
}

#[test]
fn reconcile_is_idempotent() {
    let mut recycler = Recycler::new();
    let created = std::cell::Cell::new(0);
    let destroyed = std::cell::Cell::new(0);
    let w = window(3, 8, 10, true);

    let mut next = 0u32;
    let mut factory = |_slot: Slot| {
        created.set(created.get() + 1);
        next += 1;
        next
    };
    recycler.reconcile_with(&w, &mut factory, |_, _| destroyed.set(destroyed.get() + 1));
    let ids: Vec<u32> = recycler.realized().iter().map(|r| r.handle).collect();
    recycler.reconcile_with(&w, &mut factory, |_, _| destroyed.set(destroyed.get() + 1));

    assert_eq!(created.get(), 5);
    assert_eq!(destroyed.get(), 0);
    assert_eq!(
        recycler.realized().iter().map(|r| r.handle).collect::<Vec<_>>(),
        ids
    );
}

#[test]
fn reconcile_realizes_the_sentinel_last() {
    let mut recycler = Recycler::new();
    recycler.reconcile_with(&window(8, 11, 10, true), |slot| slot, |_, _| {});
    assert_eq!(
        recycler.slots().collect::<Vec<_>>(),
        vec![Slot::Item(8), Slot::Item(9), Slot::Sentinel]
    );

    let mut released = Vec::new();
    recycler.reconcile_with(&window(8, 10, 10, false), |slot| slot, |slot, _| {
        released.push(slot)
    });
    assert_eq!(released, vec![Slot::Sentinel]);
}

struct Keep;

impl HandleLifecycle<Slot> for Keep {
    fn realize(&mut self, slot: Slot) -> Slot {
        slot
    }

    fn recycle(&mut self, _slot: Slot, _handle: Slot) {}
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "realized-set invariant violated")]
fn out_of_order_remap_is_reported() {
    let mut recycler: Recycler<Slot> = Recycler::new();
    recycler.reconcile(&window(0, 3, 3, false), &mut Keep);
    recycler.remap(|slot| slot.index().map(|i| Slot::Item(2 - i)), &mut Keep);
}

proptest! {
    #[test]
    fn realized_set_matches_window_after_every_reconcile(
        steps in prop::collection::vec((0usize..60, 0usize..20, any::<bool>()), 1..40),
    ) {
        let mut recycler = Recycler::new();
        let mut live = 0i64;
        let item_count = 50;
        for (first, len, sentinel) in steps {
            let w = window(first, first + len, item_count, sentinel);
            let mut created = 0i64;
            let mut destroyed = 0i64;
            recycler.reconcile_with(
                &w,
                |slot| {
                    created += 1;
                    slot
                },
                |_, _| destroyed += 1,
            );
            live += created - destroyed;

            let slots: Vec<Slot> = recycler.slots().collect();
            prop_assert!(slots.windows(2).all(|p| p[0] < p[1]));
            prop_assert_eq!(&slots, &w.slots().collect::<Vec<_>>());
            prop_assert!(recycler.realized().iter().all(|r| r.slot == r.handle));
            prop_assert_eq!(live, slots.len() as i64);
        }
    }

    #[test]
    fn offset_stays_within_bounds(
        n in 0u32..200,
        viewport in 0.0f64..500.0,
        moves in prop::collection::vec(-3000.0f64..3000.0, 1..20),
    ) {
        let mut engine = uniform_engine(n, viewport);
        engine.run_pass();
        for y in moves {
            engine.set_offset(Axis::Vertical, y);
            engine.run_pass();
            let offset = engine.offset().y;
            prop_assert!(offset >= 0.0);
            prop_assert!(offset <= engine.max_offset().y);
        }
    }

    #[test]
    fn at_most_one_fetch_in_flight(
        n in 0u32..40,
        moves in prop::collection::vec((-500.0f64..1500.0, any::<bool>()), 1..30),
    ) {
        let mut engine = uniform_engine(n, 60.0);
        for (y, request) in moves {
            engine.set_offset(Axis::Vertical, y);
            if request {
                engine.request_load();
            }
            engine.run_pass();
            prop_assert!(engine.source().fetches <= 1);
        }
    }
}
