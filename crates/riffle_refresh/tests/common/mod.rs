#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use riffle_core::{
    AnimationCompletion, DragPhase, Edge, Insets, Listener, ListenerId, Point, Rect,
    ScrollSurface, SignalKind, Size, ViewId,
};
use riffle_refresh::{HeadlessSurface, LoadMoreFooter, LoadMoreState, RefreshHeader, RefreshState};

pub const HEADER: ViewId = ViewId(1);
pub const FOOTER: ViewId = ViewId(2);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("riffle_core=trace,riffle_animation=trace,riffle_refresh=trace")
        .with_test_writer()
        .try_init();
}

/// A headless surface plus the same surface as a trait object
pub fn surface(viewport: Size, content: Size) -> (Arc<HeadlessSurface>, Arc<dyn ScrollSurface>) {
    let surface = HeadlessSurface::new(viewport);
    surface.set_content_size(content);
    let shared: Arc<dyn ScrollSurface> = surface.clone();
    (surface, shared)
}

/// Press, move through `offsets`, and lift
pub fn drag(surface: &HeadlessSurface, offsets: &[f32]) {
    surface.set_drag_phase(DragPhase::Began);
    for y in offsets {
        surface.set_drag_phase(DragPhase::Changed);
        surface.scroll_to(Point::new(0.0, *y));
    }
    surface.set_drag_phase(DragPhase::Ended);
}

#[derive(Default)]
pub struct Counter(AtomicUsize);

impl Counter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// A trigger closure that bumps this counter
    pub fn trigger(self: &Arc<Self>) -> impl Fn() + Send + Sync + 'static {
        let counter = Arc::clone(self);
        move || counter.hit()
    }
}

pub struct RecordingHeader {
    pub size: Size,
    pub edge: Insets,
    pub transitions: Mutex<Vec<(RefreshState, RefreshState)>>,
}

impl RecordingHeader {
    pub fn new(height: f32) -> Arc<Self> {
        Self::with_edge(height, Insets::ZERO)
    }

    pub fn with_edge(height: f32, edge: Insets) -> Arc<Self> {
        Arc::new(Self {
            size: Size::new(320.0, height),
            edge,
            transitions: Mutex::new(Vec::new()),
        })
    }

    pub fn transitions(&self) -> Vec<(RefreshState, RefreshState)> {
        self.transitions.lock().unwrap().clone()
    }
}

impl RefreshHeader for RecordingHeader {
    fn view_id(&self) -> ViewId {
        HEADER
    }

    fn size(&self) -> Size {
        self.size
    }

    fn edge_insets(&self) -> Insets {
        self.edge
    }

    fn on_refresh_state_changed(&self, previous: RefreshState, next: RefreshState) {
        self.transitions.lock().unwrap().push((previous, next));
    }
}

pub struct RecordingFooter {
    pub size: Size,
    pub preload: f32,
    pub keep_when_exhausted: bool,
    pub transitions: Mutex<Vec<(LoadMoreState, LoadMoreState)>>,
}

impl RecordingFooter {
    pub fn new(height: f32) -> Arc<Self> {
        Self::with_options(height, 0.0, true)
    }

    pub fn with_options(height: f32, preload: f32, keep_when_exhausted: bool) -> Arc<Self> {
        Arc::new(Self {
            size: Size::new(320.0, height),
            preload,
            keep_when_exhausted,
            transitions: Mutex::new(Vec::new()),
        })
    }

    pub fn transitions(&self) -> Vec<(LoadMoreState, LoadMoreState)> {
        self.transitions.lock().unwrap().clone()
    }
}

impl LoadMoreFooter for RecordingFooter {
    fn view_id(&self) -> ViewId {
        FOOTER
    }

    fn size(&self) -> Size {
        self.size
    }

    fn preload(&self) -> f32 {
        self.preload
    }

    fn is_visible_when_exhausted(&self) -> bool {
        self.keep_when_exhausted
    }

    fn on_load_more_state_changed(&self, previous: LoadMoreState, next: LoadMoreState) {
        self.transitions.lock().unwrap().push((previous, next));
    }
}

/// Wraps a headless surface and scrolls it by `step` on every inset write,
/// the way a toolkit adjusts the offset when insets change
pub struct NudgingSurface {
    inner: Arc<HeadlessSurface>,
    step: f32,
}

impl NudgingSurface {
    pub fn new(inner: Arc<HeadlessSurface>, step: f32) -> Arc<dyn ScrollSurface> {
        Arc::new(Self { inner, step })
    }

    fn nudge(&self) {
        let offset = self.inner.content_offset();
        self.inner.scroll_to(Point::new(offset.x, offset.y + self.step));
    }
}

impl ScrollSurface for NudgingSurface {
    fn content_offset(&self) -> Point {
        self.inner.content_offset()
    }

    fn content_size(&self) -> Size {
        self.inner.content_size()
    }

    fn bounds(&self) -> Rect {
        self.inner.bounds()
    }

    fn insets(&self) -> Insets {
        self.inner.insets()
    }

    fn drag_phase(&self) -> DragPhase {
        self.inner.drag_phase()
    }

    fn set_inset(&self, edge: Edge, value: f32) {
        self.inner.set_inset(edge, value);
        self.nudge();
    }

    fn animate_inset(
        &self,
        edge: Edge,
        value: f32,
        duration: Duration,
        completion: AnimationCompletion,
    ) {
        self.inner.animate_inset(edge, value, duration, completion);
        self.nudge();
    }

    fn subscribe(&self, kind: SignalKind, listener: Listener) -> ListenerId {
        self.inner.subscribe(kind, listener)
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        self.inner.unsubscribe(id)
    }

    fn insert_child(&self, view: ViewId, frame: Rect) {
        self.inner.insert_child(view, frame);
    }

    fn set_child_frame(&self, view: ViewId, frame: Rect) {
        self.inner.set_child_frame(view, frame);
    }

    fn set_child_hidden(&self, view: ViewId, hidden: bool) {
        self.inner.set_child_hidden(view, hidden);
    }

    fn remove_child(&self, view: ViewId) {
        self.inner.remove_child(view);
    }

    fn contains_child(&self, view: ViewId) -> bool {
        self.inner.contains_child(view)
    }
}
