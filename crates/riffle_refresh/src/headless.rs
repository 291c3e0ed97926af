//! In-memory scroll surface
//!
//! [`HeadlessSurface`] implements [`ScrollSurface`] without a UI toolkit.
//! It emits signals only when a value actually changes and drives inset
//! animations through an [`AnimationScheduler`] that the caller advances
//! explicitly, which makes controller behavior reproducible in tests and
//! simulations.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use riffle_animation::{AnimationScheduler, Easing, InsetTween};
use riffle_core::sync::lock;
use riffle_core::{
    AnimationCompletion, DragPhase, Edge, Insets, Listener, ListenerId, Point, Rect,
    ScrollSurface, Signal, SignalKind, Size, ViewId,
};
use slotmap::SlotMap;

/// Frame step used by [`HeadlessSurface::settle`]
const SETTLE_STEP: Duration = Duration::from_millis(16);
/// Upper bound on frames stepped by [`HeadlessSurface::settle`]
const SETTLE_MAX_FRAMES: usize = 10_000;

type SharedListener = Arc<dyn Fn(Signal) + Send + Sync>;

/// A child view attached to a [`HeadlessSurface`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadlessChild {
    pub frame: Rect,
    pub hidden: bool,
}

#[derive(Debug)]
struct SurfaceState {
    offset: Point,
    content_size: Size,
    bounds: Rect,
    insets: Insets,
    drag_phase: DragPhase,
    children: BTreeMap<ViewId, HeadlessChild>,
}

/// A scroll surface backed by plain values
pub struct HeadlessSurface {
    state: Mutex<SurfaceState>,
    listeners: Mutex<SlotMap<ListenerId, (SignalKind, SharedListener)>>,
    scheduler: Mutex<AnimationScheduler>,
    easing: Easing,
}

impl HeadlessSurface {
    /// Create a surface with the given viewport and empty content
    pub fn new(viewport: Size) -> Arc<Self> {
        Self::with_easing(viewport, Easing::default())
    }

    pub fn with_easing(viewport: Size, easing: Easing) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SurfaceState {
                offset: Point::default(),
                content_size: Size::default(),
                bounds: viewport.to_rect(),
                insets: Insets::ZERO,
                drag_phase: DragPhase::Possible,
                children: BTreeMap::new(),
            }),
            listeners: Mutex::new(SlotMap::with_key()),
            scheduler: Mutex::new(AnimationScheduler::new()),
            easing,
        })
    }

    /// Move the content, notifying offset listeners if it changed
    pub fn scroll_to(&self, offset: Point) {
        let changed = {
            let mut state = lock(&self.state);
            std::mem::replace(&mut state.offset, offset) != offset
        };
        if changed {
            self.emit(Signal::Offset(offset));
        }
    }

    /// Resize the content, notifying size listeners if it changed
    pub fn set_content_size(&self, size: Size) {
        let changed = {
            let mut state = lock(&self.state);
            std::mem::replace(&mut state.content_size, size) != size
        };
        if changed {
            self.emit(Signal::ContentSize(size));
        }
    }

    /// Update the pan gesture phase, notifying drag listeners if it changed
    pub fn set_drag_phase(&self, phase: DragPhase) {
        let changed = {
            let mut state = lock(&self.state);
            std::mem::replace(&mut state.drag_phase, phase) != phase
        };
        if changed {
            self.emit(Signal::DragPhase(phase));
        }
    }

    /// Resize the viewport
    ///
    /// There is no viewport signal; observers pick the new bounds up with
    /// the next signal of any kind.
    pub fn set_bounds(&self, bounds: Rect) {
        lock(&self.state).bounds = bounds;
    }

    /// Replace all insets at once, cancelling running inset animations
    pub fn set_insets(&self, insets: Insets) {
        for edge in Edge::ALL {
            self.set_inset(edge, insets.get(edge));
        }
    }

    /// Step running inset animations forward by `dt`
    pub fn advance(&self, dt: Duration) {
        let update = lock(&self.scheduler).step(dt.as_secs_f32() * 1000.0);
        if update.is_empty() {
            return;
        }

        {
            let mut state = lock(&self.state);
            for (edge, value) in &update.values {
                state.insets.set(*edge, *value);
            }
        }
        tracing::trace!(frames = update.values.len(), "Headless frame");
        update.complete();
    }

    /// Step until no inset animation is running
    pub fn settle(&self) {
        for _ in 0..SETTLE_MAX_FRAMES {
            if !self.is_animating() {
                return;
            }
            self.advance(SETTLE_STEP);
        }
        tracing::warn!("Headless surface did not settle");
    }

    pub fn is_animating(&self) -> bool {
        lock(&self.scheduler).has_active_animations()
    }

    /// Target of the animation running on `edge`, if any
    pub fn animation_target(&self, edge: Edge) -> Option<f32> {
        lock(&self.scheduler).target(edge)
    }

    pub fn child(&self, view: ViewId) -> Option<HeadlessChild> {
        lock(&self.state).children.get(&view).copied()
    }

    pub fn child_count(&self) -> usize {
        lock(&self.state).children.len()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    fn emit(&self, signal: Signal) {
        let kind = signal.kind();
        let listeners: Vec<SharedListener> = lock(&self.listeners)
            .values()
            .filter(|(k, _)| *k == kind)
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(signal);
        }
    }
}

impl ScrollSurface for HeadlessSurface {
    fn content_offset(&self) -> Point {
        lock(&self.state).offset
    }

    fn content_size(&self) -> Size {
        lock(&self.state).content_size
    }

    fn bounds(&self) -> Rect {
        lock(&self.state).bounds
    }

    fn insets(&self) -> Insets {
        lock(&self.state).insets
    }

    fn drag_phase(&self) -> DragPhase {
        lock(&self.state).drag_phase
    }

    fn set_inset(&self, edge: Edge, value: f32) {
        let superseded = lock(&self.scheduler).cancel(edge);
        lock(&self.state).insets.set(edge, value);
        if let Some(completion) = superseded {
            completion(false);
        }
    }

    fn animate_inset(
        &self,
        edge: Edge,
        value: f32,
        duration: Duration,
        completion: AnimationCompletion,
    ) {
        if duration.is_zero() {
            self.set_inset(edge, value);
            completion(true);
            return;
        }

        let from = lock(&self.state).insets.get(edge);
        let tween =
            InsetTween::new(edge, from, value, duration, self.easing).with_completion(completion);
        let (_, superseded) = lock(&self.scheduler).animate(tween);
        if let Some(completion) = superseded {
            completion(false);
        }
    }

    fn subscribe(&self, kind: SignalKind, listener: Listener) -> ListenerId {
        lock(&self.listeners).insert((kind, Arc::from(listener)))
    }

    fn unsubscribe(&self, id: ListenerId) -> bool {
        lock(&self.listeners).remove(id).is_some()
    }

    fn insert_child(&self, view: ViewId, frame: Rect) {
        lock(&self.state).children.insert(
            view,
            HeadlessChild {
                frame,
                hidden: false,
            },
        );
    }

    fn set_child_frame(&self, view: ViewId, frame: Rect) {
        if let Some(child) = lock(&self.state).children.get_mut(&view) {
            child.frame = frame;
        }
    }

    fn set_child_hidden(&self, view: ViewId, hidden: bool) {
        if let Some(child) = lock(&self.state).children.get_mut(&view) {
            child.hidden = hidden;
        }
    }

    fn remove_child(&self, view: ViewId) {
        lock(&self.state).children.remove(&view);
    }

    fn contains_child(&self, view: ViewId) -> bool {
        lock(&self.state).children.contains_key(&view)
    }
}
