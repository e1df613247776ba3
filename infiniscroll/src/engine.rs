use crate::estimator::{ExtentEstimator, MIN_ESTIMATE};
use crate::recycler::{HandleLifecycle, Recycler};
use crate::types::non_negative;
use crate::window::{compute_range, leading_edge};
use crate::{
    Align, Axis, DataSource, EngineOptions, HeightStrategy, ItemsChange, LoadState, Loader,
    PassReport, PassTrigger, Phase, Point, RenderSurface, ScrollDirection, ScrollInfo, Size, Slot,
    Window,
};

/// Factory/destroyer pair backed by the render surface and the free handle pool.
struct SurfaceLifecycle<'a, S, D>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    surface: &'a mut S,
    source: &'a D,
    pool: &'a mut Vec<S::Handle>,
    pool_capacity: usize,
}

impl<S, D> HandleLifecycle<S::Handle> for SurfaceLifecycle<'_, S, D>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    fn realize(&mut self, slot: Slot) -> S::Handle {
        let item = slot.index().and_then(|i| self.source.item_at(i));
        match self.pool.pop() {
            Some(handle) => self.surface.rebind_handle(handle, slot, item),
            None => self.surface.create_handle(slot, item),
        }
    }

    fn recycle(&mut self, _slot: Slot, handle: S::Handle) {
        if self.pool.len() < self.pool_capacity {
            self.pool.push(handle);
        } else {
            self.surface.destroy_handle(handle);
        }
    }
}

macro_rules! lifecycle {
    ($engine:ident, $capacity:expr) => {
        SurfaceLifecycle {
            surface: &mut $engine.surface,
            source: $engine.loader.source(),
            pool: &mut $engine.pool,
            pool_capacity: $capacity,
        }
    };
}

#[derive(Clone, Copy, Debug, Default)]
struct Measured {
    height: f64,
    max_width: f64,
    sentinel_height: f64,
}

/// The virtualization engine.
///
/// Owns the authoritative geometry (viewport, offset, extent), the realized handles and the
/// load-more machinery, and drives the two collaborators:
/// - a [`RenderSurface`] that creates, measures and arranges handles
/// - a [`DataSource`] that holds the items and fetches more of them
///
/// Hosts feed geometry through the setters (`set_viewport`, `set_offset`, the step helpers)
/// and call [`Engine::run_pass`] whenever [`Engine::needs_pass`] is `true`. Every pass runs to
/// completion before the next one; the only out-of-band work is the data source's fetch, whose
/// outcome is applied at the start of a later pass.
pub struct Engine<S, D>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    options: EngineOptions,
    surface: S,
    loader: Loader<D>,
    estimator: ExtentEstimator,
    recycler: Recycler<S::Handle>,
    pool: Vec<S::Handle>,
    sizes: Vec<Size>, // measured sizes, parallel to the realized handles
    viewport: Size,
    offset: Point,
    extent: Size,
    lead: f64,
    window: Window,
    phase: Phase,
    pending: Option<PassTrigger>,
    notify_depth: usize,
    notify_pending: bool,
}

impl<S, D> Engine<S, D>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    pub fn new(options: EngineOptions, surface: S, source: D) -> Self {
        idebug!(
            strategy = ?options.height_strategy,
            slack = options.viewport_slack,
            items = source.item_count(),
            "Engine::new"
        );
        let estimator = ExtentEstimator::new(options.height_strategy);
        let viewport = options.initial_viewport.unwrap_or_default().sanitized();
        let extent = Size::new(0.0, estimator.total_extent(source.item_count()));
        let loader = Loader::new(source, options.on_wake.clone());
        let window = Window {
            range: Default::default(),
            item_count: loader.source().item_count(),
            sentinel: loader.has_sentinel(),
        };
        Self {
            options,
            surface,
            loader,
            estimator,
            recycler: Recycler::new(),
            pool: Vec::new(),
            sizes: Vec::new(),
            viewport,
            offset: Point::ORIGIN,
            extent,
            lead: 0.0,
            window,
            phase: Phase::Idle,
            pending: Some(PassTrigger::Viewport),
            notify_depth: 0,
            notify_pending: false,
        }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn source(&self) -> &D {
        self.loader.source()
    }

    /// Mutable access to the data source.
    ///
    /// Report any change made to the item sequence through [`Engine::items_changed`].
    pub fn source_mut(&mut self) -> &mut D {
        self.loader.source_mut()
    }

    pub fn estimator(&self) -> &ExtentEstimator {
        &self.estimator
    }

    pub fn item_count(&self) -> usize {
        self.loader.source().item_count()
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn offset(&self) -> Point {
        self.offset
    }

    pub fn extent(&self) -> Size {
        self.extent
    }

    pub fn scroll_info(&self) -> ScrollInfo {
        ScrollInfo {
            viewport: self.viewport,
            offset: self.offset,
            extent: self.extent,
        }
    }

    pub fn max_offset(&self) -> Point {
        self.scroll_info().max_offset()
    }

    /// The window realized by the last pass.
    pub fn window(&self) -> Window {
        self.window
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn load_state(&self) -> &LoadState {
        self.loader.state()
    }

    /// Realized handles in ascending slot order.
    pub fn realized(&self) -> impl Iterator<Item = (Slot, &S::Handle)> + '_ {
        self.recycler.realized().iter().map(|r| (r.slot, &r.handle))
    }

    pub fn handle(&self, slot: Slot) -> Option<&S::Handle> {
        self.recycler.get(slot)
    }

    pub fn pooled_handles(&self) -> usize {
        self.pool.len()
    }

    /// Whether something changed since the last pass (geometry, items, or a queued fetch
    /// outcome).
    pub fn needs_pass(&self) -> bool {
        self.pending.is_some() || self.loader.has_completions()
    }

    /// Forces a re-measure on the next pass.
    pub fn request_remeasure(&mut self) {
        self.schedule(PassTrigger::Remeasure);
    }

    fn schedule(&mut self, trigger: PassTrigger) {
        if self.pending.is_none() {
            itrace!(?trigger, phase = ?self.phase, "pass scheduled");
            self.pending = Some(trigger);
        }
    }

    /// Replaces the viewport (the host resized). Invalid sizes are treated as zero.
    pub fn set_viewport(&mut self, viewport: Size) -> bool {
        let viewport = viewport.sanitized();
        if self.viewport == viewport {
            return false;
        }
        self.viewport = viewport;
        self.schedule(PassTrigger::Viewport);
        self.invalidate();
        true
    }

    /// Sets the offset along `axis`, clamped to `[0, max(0, extent - viewport)]`.
    ///
    /// Non-finite values are ignored. Observers are only notified when the applied value
    /// differs from the requested one, since the caller already knows what it asked for.
    ///
    /// Returns the applied offset.
    pub fn set_offset(&mut self, axis: Axis, value: f64) -> f64 {
        let current = self.offset.along(axis);
        if !value.is_finite() {
            return current;
        }
        let applied = value.clamp(0.0, self.max_offset().along(axis));
        if applied != current {
            self.offset = self.offset.with(axis, applied);
            self.schedule(PassTrigger::Offset);
            if applied != value {
                self.invalidate();
            }
        }
        applied
    }

    /// Sets both offset components. Returns the applied offset.
    pub fn scroll_to(&mut self, offset: Point) -> Point {
        Point {
            x: self.set_offset(Axis::Horizontal, offset.x),
            y: self.set_offset(Axis::Vertical, offset.y),
        }
    }

    /// Applies a host-reported scroll delta. Returns the applied offset along `axis`.
    pub fn scroll_by(&mut self, axis: Axis, delta: f64) -> f64 {
        let current = self.offset.along(axis);
        self.set_offset(axis, current + delta)
    }

    /// The distance of one line step: the item estimate vertically, `cross_line_step`
    /// horizontally.
    pub fn line_size(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.estimator.estimate().unwrap_or(MIN_ESTIMATE),
            Axis::Horizontal => non_negative(self.options.cross_line_step),
        }
    }

    pub fn line_step(&mut self, axis: Axis, direction: ScrollDirection) -> f64 {
        self.scroll_by(axis, direction.signum() * self.line_size(axis))
    }

    pub fn page_step(&mut self, axis: Axis, direction: ScrollDirection) -> f64 {
        self.scroll_by(axis, direction.signum() * self.viewport.along(axis))
    }

    pub fn wheel_step(&mut self, axis: Axis, direction: ScrollDirection) -> f64 {
        let lines = f64::from(self.options.wheel_lines);
        self.scroll_by(axis, direction.signum() * lines * self.line_size(axis))
    }

    /// The (clamped) vertical offset that shows item `index` with the given alignment.
    pub fn scroll_to_index_offset(&self, index: usize, align: Align) -> f64 {
        let count = self.item_count();
        if count == 0 {
            return 0.0;
        }
        let index = index.min(count - 1);
        let size = self.estimator.estimate().unwrap_or(0.0);
        let start = index as f64 * size;
        let end = start + size;
        let view = self.viewport.height;
        let current = self.offset.y;

        let target = match align {
            Align::Start => start,
            Align::End => end - view,
            Align::Center => start + size / 2.0 - view / 2.0,
            Align::Auto => {
                if start >= current && end <= current + view {
                    current
                } else if start < current {
                    start
                } else {
                    end - view
                }
            }
        };
        target.clamp(0.0, self.max_offset().y)
    }

    /// Scrolls the minimum distance needed to show item `index`. Returns the applied offset.
    pub fn scroll_into_view(&mut self, index: usize) -> f64 {
        let target = self.scroll_to_index_offset(index, Align::Auto);
        self.set_offset(Axis::Vertical, target)
    }

    /// Applies a change the host made to the item sequence.
    ///
    /// Handles bound to affected items are recycled, the rest follow their items to their new
    /// indexes, and a pass is scheduled.
    pub fn items_changed(&mut self, change: ItemsChange) {
        idebug!(?change, "items_changed");
        match change {
            ItemsChange::Inserted { index, count } => self.estimator.insert(index, count),
            ItemsChange::Removed { index, count } => self.estimator.remove(index, count),
            ItemsChange::Replaced { index, count } => self.estimator.invalidate(index, count),
            ItemsChange::Moved { from, to } => {
                self.estimator.remove(from, 1);
                self.estimator.insert(to, 1);
            }
            ItemsChange::Reset => self.estimator.clear(),
        }
        let mut lifecycle = lifecycle!(self, self.options.pool_capacity);
        self.recycler.remap(|slot| change.remap(slot), &mut lifecycle);
        self.schedule(PassTrigger::Items);
    }

    /// Posts a host-initiated load (e.g. a "load more" button) and dispatches it right away.
    pub fn request_load(&mut self) -> bool {
        let fired = self.loader.request();
        if fired {
            self.notify_load_state();
            self.loader.dispatch();
        }
        fired
    }

    /// Leaves `Errored` and dispatches a new fetch.
    pub fn retry_load(&mut self) -> bool {
        let retried = self.loader.retry();
        if retried {
            self.notify_load_state();
            self.loader.dispatch();
        }
        retried
    }

    /// Runs one measure/arrange pass.
    ///
    /// 1. Apply queued fetch outcomes.
    /// 2. Compute the window, reconcile handles, measure them, update the extent. Repeat
    ///    (bounded by `max_remeasure_passes`) while the viewport is not covered.
    /// 3. Arrange the handles.
    /// 4. Evaluate the load-more trigger; a fetch is dispatched after the pass has finished.
    pub fn run_pass(&mut self) -> PassReport {
        let trigger = self.pending.take().unwrap_or(PassTrigger::Remeasure);
        self.notify_depth += 1;

        let drained = self.loader.drain();
        if drained.state_changed {
            self.notify_load_state();
        }

        self.phase = Phase::Measuring;
        itrace!(
            ?trigger,
            items = self.item_count(),
            offset_y = self.offset.y,
            viewport_h = self.viewport.height,
            "pass start"
        );

        let max_retries = self.options.max_remeasure_passes.max(1) - 1;
        let mut retries = 0usize;
        let mut attempts = 0usize;
        let mut extra = 0usize;
        let covered = loop {
            attempts += 1;
            self.clamp_offset();
            let bootstrap = !self.estimator.has_samples();
            let window = compute_range(
                self.offset,
                self.viewport,
                self.item_count(),
                self.loader.has_sentinel(),
                &self.estimator,
                self.options.viewport_slack.saturating_add(extra),
            );
            self.lead = leading_edge(self.offset, &self.estimator);
            self.reconcile(window);
            let measured = self.measure();
            self.update_extent(&measured);

            if bootstrap && self.estimator.has_samples() {
                continue;
            }

            let max = self.max_offset();
            let out_of_range = self.offset.x > max.x || self.offset.y > max.y;
            let vacant = self.viewport.height - (measured.height + self.lead);
            let more_slots = window.range.last < window.slot_count();
            if !out_of_range && (vacant <= 0.0 || (!more_slots && self.offset.y <= 0.0)) {
                break true;
            }
            if retries >= max_retries {
                iwarn!(
                    attempts,
                    vacant,
                    first = window.range.first,
                    last = window.range.last,
                    "coverage incomplete: re-measure cap reached"
                );
                break false;
            }
            retries += 1;
            if out_of_range {
                continue;
            }
            if more_slots {
                let estimate = self.line_size(Axis::Vertical).max(MIN_ESTIMATE);
                extra += ((vacant / estimate).ceil() as usize).max(1);
            } else {
                // The window already ends at the last slot: pull the offset back instead.
                self.offset.y = (self.offset.y - vacant).max(0.0);
                self.invalidate();
            }
        };
        self.clamp_offset();

        self.phase = Phase::Arranging;
        self.arrange();

        let fired = self.loader.evaluate_window(&self.window);
        self.phase = Phase::Idle;
        if fired {
            self.notify_load_state();
        }

        self.notify_depth -= 1;
        if self.notify_depth == 0 && std::mem::take(&mut self.notify_pending) {
            self.notify_now();
        }

        let fetch_dispatched = self.loader.dispatch();
        itrace!(
            first = self.window.range.first,
            last = self.window.range.last,
            extent_h = self.extent.height,
            attempts,
            covered,
            fetch_dispatched,
            "pass end"
        );
        PassReport {
            trigger,
            window: self.window,
            extent: self.extent,
            offset: self.offset,
            attempts,
            covered,
            fetch_dispatched,
        }
    }

    /// Runs passes until nothing is pending, at most `max_passes` times. Returns the number of
    /// passes run.
    pub fn settle(&mut self, max_passes: usize) -> usize {
        let mut passes = 0;
        while passes < max_passes && self.needs_pass() {
            self.run_pass();
            passes += 1;
        }
        passes
    }

    /// Destroys every realized and pooled handle and abandons any in-flight fetch.
    ///
    /// Returns the collaborators. A fetch resolved after this point is ignored; dropping the
    /// engine has the same effect on fetches but leaves handle destruction to `Drop`.
    pub fn teardown(mut self) -> (S, D) {
        idebug!(realized = self.recycler.len(), pooled = self.pool.len(), "teardown");
        let mut lifecycle = lifecycle!(self, 0);
        self.recycler.clear(&mut lifecycle);
        for handle in self.pool.drain(..) {
            self.surface.destroy_handle(handle);
        }
        self.loader.cancel();
        (self.surface, self.loader.into_source())
    }

    fn reconcile(&mut self, window: Window) {
        let mut lifecycle = lifecycle!(self, self.options.pool_capacity);
        self.recycler.reconcile(&window, &mut lifecycle);
        self.window = window;
    }

    fn measure(&mut self) -> Measured {
        let uniform = match self.estimator.strategy() {
            HeightStrategy::Uniform(h) => Some(h),
            HeightStrategy::Estimated => None,
        };
        let constraint = match uniform {
            Some(h) => Size::new(f64::INFINITY, h),
            None => Size::new(self.viewport.width, f64::INFINITY),
        };

        let mut measured = Measured::default();
        self.sizes.clear();
        for r in self.recycler.realized() {
            let mut size = self.surface.measure(&r.handle, constraint).sanitized();
            match r.slot {
                Slot::Item(index) => match uniform {
                    Some(h) => size.height = h,
                    None => self.estimator.record_measurement(index, size.height),
                },
                Slot::Sentinel => measured.sentinel_height = size.height,
            }
            measured.height += size.height;
            measured.max_width = measured.max_width.max(size.width);
            self.sizes.push(size);
        }
        measured
    }

    fn update_extent(&mut self, measured: &Measured) {
        let extent = Size {
            width: measured.max_width,
            height: self.estimator.total_extent(self.item_count()) + measured.sentinel_height,
        };
        if extent != self.extent {
            itrace!(width = extent.width, height = extent.height, "extent changed");
            self.extent = extent;
            self.invalidate();
        }
    }

    fn arrange(&mut self) {
        let x = -self.offset.x;
        let mut y = self.lead;
        let width = self.viewport.width;
        for (r, size) in self.recycler.realized_mut().iter_mut().zip(&self.sizes) {
            let arranged = Size::new(size.width.max(width), size.height);
            self.surface.arrange(&mut r.handle, Point::new(x, y), arranged);
            y += size.height;
        }
    }

    fn clamp_offset(&mut self) {
        let max = self.max_offset();
        let clamped = Point {
            x: self.offset.x.clamp(0.0, max.x),
            y: self.offset.y.clamp(0.0, max.y),
        };
        if clamped != self.offset {
            itrace!(from = self.offset.y, to = clamped.y, "offset clamped");
            self.offset = clamped;
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        if self.notify_depth > 0 {
            self.notify_pending = true;
            return;
        }
        self.notify_now();
    }

    fn notify_now(&self) {
        if let Some(cb) = &self.options.on_invalidate {
            cb(self.scroll_info());
        }
    }

    fn notify_load_state(&self) {
        if let Some(cb) = &self.options.on_load_state {
            cb(self.loader.state());
        }
    }
}

impl<S, D> core::fmt::Debug for Engine<S, D>
where
    D: DataSource,
    S: RenderSurface<D::Item>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("viewport", &self.viewport)
            .field("offset", &self.offset)
            .field("extent", &self.extent)
            .field("window", &self.window)
            .field("phase", &self.phase)
            .field("load_state", self.loader.state())
            .finish_non_exhaustive()
    }
}
