//! Scroll signal observer
//!
//! Turns a surface's three independent change streams (offset, content
//! size, drag phase) into a single stream of immutable [`ScrollSnapshot`]
//! diffs. The observer keeps no interaction state of its own; it merges
//! each signal into the last emitted snapshot and relays the pair only
//! when something actually changed.
//!
//! # Example
//!
//! ```rust,ignore
//! let observer = ScrollSignalObserver::attach(&surface, |previous, next| {
//!     let diff = previous.diff(next);
//!     if diff.offset_changed {
//!         println!("scrolled to {:?}", next.offset);
//!     }
//! });
//! ```
//!
//! The surface is held weakly. Listeners are removed when the observer is
//! detached or dropped, and a listener that outlives its observer (or whose
//! surface is gone) never relays anything.

use std::sync::{Arc, Mutex, Weak};

use smallvec::SmallVec;

use crate::error::{Result, RiffleError};
use crate::events::{DragPhase, Signal, SignalKind};
use crate::geometry::{Point, Size};
use crate::surface::{ListenerId, ScrollSurface};
use crate::sync::lock;

/// Every observed surface property at one instant
///
/// Compared field by field with exact float equality.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollSnapshot {
    pub offset: Point,
    pub content_size: Size,
    pub viewport_size: Size,
    pub drag_phase: DragPhase,
}

impl ScrollSnapshot {
    /// Merge one signal into this snapshot
    pub fn with_signal(mut self, signal: Signal) -> Self {
        match signal {
            Signal::Offset(offset) => self.offset = offset,
            Signal::ContentSize(size) => self.content_size = size,
            Signal::DragPhase(phase) => self.drag_phase = phase,
        }
        self
    }

    /// Which fields differ between `self` and `next`
    pub fn diff(&self, next: &ScrollSnapshot) -> SnapshotDiff {
        SnapshotDiff {
            offset_changed: self.offset != next.offset,
            content_size_changed: self.content_size != next.content_size,
            viewport_changed: self.viewport_size != next.viewport_size,
            drag_phase_changed: self.drag_phase != next.drag_phase,
        }
    }
}

/// Field-level changes between two snapshots
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub offset_changed: bool,
    pub content_size_changed: bool,
    pub viewport_changed: bool,
    pub drag_phase_changed: bool,
}

impl SnapshotDiff {
    /// Content size or viewport changed
    pub fn layout_changed(&self) -> bool {
        self.content_size_changed || self.viewport_changed
    }

    pub fn is_empty(&self) -> bool {
        !(self.offset_changed || self.layout_changed() || self.drag_phase_changed)
    }
}

/// Relays snapshot diffs from one surface to one change handler
pub struct ScrollSignalObserver {
    surface: Weak<dyn ScrollSurface>,
    listeners: SmallVec<[ListenerId; 3]>,
    last: Arc<Mutex<ScrollSnapshot>>,
}

impl ScrollSignalObserver {
    /// Start observing `surface`
    ///
    /// `on_change(previous, next)` runs on whichever thread the surface
    /// delivers signals on, with no observer lock held.
    pub fn attach<F>(surface: &Arc<dyn ScrollSurface>, on_change: F) -> Self
    where
        F: Fn(&ScrollSnapshot, &ScrollSnapshot) + Send + Sync + 'static,
    {
        let last = Arc::new(Mutex::new(surface.snapshot()));
        let on_change = Arc::new(on_change);
        let weak_surface = Arc::downgrade(surface);

        let listeners = SignalKind::ALL
            .iter()
            .map(|kind| {
                let weak = weak_surface.clone();
                let last = Arc::downgrade(&last);
                let on_change = on_change.clone();

                surface.subscribe(
                    *kind,
                    Box::new(move |signal| relay(&weak, &last, signal, &*on_change)),
                )
            })
            .collect();

        tracing::debug!("Scroll observer attached");

        Self {
            surface: weak_surface,
            listeners,
            last,
        }
    }

    /// Start observing a surface held only weakly by the caller
    pub fn try_attach<F>(surface: &Weak<dyn ScrollSurface>, on_change: F) -> Result<Self>
    where
        F: Fn(&ScrollSnapshot, &ScrollSnapshot) + Send + Sync + 'static,
    {
        let surface = surface.upgrade().ok_or(RiffleError::SurfaceGone)?;
        Ok(Self::attach(&surface, on_change))
    }

    /// Stop observing. Safe to call any number of times.
    pub fn detach(&mut self) {
        if self.listeners.is_empty() {
            return;
        }

        let listeners = std::mem::take(&mut self.listeners);
        match self.surface.upgrade() {
            Some(surface) => {
                for id in listeners {
                    surface.unsubscribe(id);
                }
                tracing::debug!("Scroll observer detached");
            }
            // The surface dropped its listener table along with itself
            None => tracing::trace!("Scroll observer detached from a dropped surface"),
        }
    }

    /// Check if listeners are registered
    pub fn is_observing(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// The last snapshot relayed (or captured at attach)
    pub fn snapshot(&self) -> ScrollSnapshot {
        *lock(&self.last)
    }
}

impl Drop for ScrollSignalObserver {
    fn drop(&mut self) {
        self.detach();
    }
}

fn relay(
    surface: &Weak<dyn ScrollSurface>,
    last: &Weak<Mutex<ScrollSnapshot>>,
    signal: Signal,
    on_change: &(dyn Fn(&ScrollSnapshot, &ScrollSnapshot) + Send + Sync),
) {
    let (Some(surface), Some(last)) = (surface.upgrade(), last.upgrade()) else {
        return;
    };

    let (previous, next) = {
        let mut last = lock(&last);
        let mut next = last.with_signal(signal);
        next.viewport_size = surface.bounds().size;
        if next == *last {
            return;
        }
        let previous = std::mem::replace(&mut *last, next);
        (previous, next)
    };

    tracing::trace!(?signal, "Scroll snapshot changed");
    on_change(&previous, &next);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Edge, Insets, Rect};
    use crate::surface::{AnimationCompletion, Listener, ViewId};
    use slotmap::SlotMap;
    use std::time::Duration;

    type SharedListener = Arc<dyn Fn(Signal) + Send + Sync>;

    #[derive(Default)]
    struct TestSurface {
        snapshot: Mutex<ScrollSnapshot>,
        listeners: Mutex<SlotMap<ListenerId, (SignalKind, SharedListener)>>,
    }

    impl TestSurface {
        fn emit(&self, signal: Signal) {
            {
                let mut snapshot = lock(&self.snapshot);
                *snapshot = snapshot.with_signal(signal);
            }
            let targets: Vec<SharedListener> = lock(&self.listeners)
                .values()
                .filter(|(kind, _)| *kind == signal.kind())
                .map(|(_, listener)| listener.clone())
                .collect();
            for listener in targets {
                listener(signal);
            }
        }

        fn listener_count(&self) -> usize {
            lock(&self.listeners).len()
        }
    }

    impl ScrollSurface for TestSurface {
        fn content_offset(&self) -> Point {
            lock(&self.snapshot).offset
        }
        fn content_size(&self) -> Size {
            lock(&self.snapshot).content_size
        }
        fn bounds(&self) -> Rect {
            lock(&self.snapshot).viewport_size.to_rect()
        }
        fn insets(&self) -> Insets {
            Insets::ZERO
        }
        fn drag_phase(&self) -> DragPhase {
            lock(&self.snapshot).drag_phase
        }
        fn set_inset(&self, _edge: Edge, _value: f32) {}
        fn animate_inset(
            &self,
            _edge: Edge,
            _value: f32,
            _duration: Duration,
            completion: AnimationCompletion,
        ) {
            completion(true);
        }
        fn subscribe(&self, kind: SignalKind, listener: Listener) -> ListenerId {
            lock(&self.listeners).insert((kind, Arc::from(listener)))
        }
        fn unsubscribe(&self, id: ListenerId) -> bool {
            lock(&self.listeners).remove(id).is_some()
        }
        fn insert_child(&self, _view: ViewId, _frame: Rect) {}
        fn set_child_frame(&self, _view: ViewId, _frame: Rect) {}
        fn set_child_hidden(&self, _view: ViewId, _hidden: bool) {}
        fn remove_child(&self, _view: ViewId) {}
        fn contains_child(&self, _view: ViewId) -> bool {
            false
        }
    }

    type Recorded = Arc<Mutex<Vec<(ScrollSnapshot, ScrollSnapshot)>>>;

    fn observe(surface: &Arc<TestSurface>) -> (ScrollSignalObserver, Recorded) {
        let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
        let sink = recorded.clone();
        let dyn_surface: Arc<dyn ScrollSurface> = surface.clone();
        let observer = ScrollSignalObserver::attach(&dyn_surface, move |previous, next| {
            sink.lock().unwrap().push((*previous, *next));
        });
        (observer, recorded)
    }

    #[test]
    fn test_relays_previous_and_next() {
        let surface = Arc::new(TestSurface::default());
        let (observer, recorded) = observe(&surface);
        assert!(observer.is_observing());
        assert_eq!(surface.listener_count(), 3);

        surface.emit(Signal::Offset(Point::new(0.0, -10.0)));
        surface.emit(Signal::DragPhase(DragPhase::Began));

        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0.offset, Point::ZERO);
        assert_eq!(recorded[0].1.offset, Point::new(0.0, -10.0));
        assert_eq!(recorded[1].0.drag_phase, DragPhase::Possible);
        assert_eq!(recorded[1].1.drag_phase, DragPhase::Began);
        assert_eq!(recorded[1].1.offset, Point::new(0.0, -10.0));
        assert_eq!(observer.snapshot(), recorded[1].1);
    }

    #[test]
    fn test_identical_signal_is_suppressed() {
        let surface = Arc::new(TestSurface::default());
        let (_observer, recorded) = observe(&surface);

        surface.emit(Signal::ContentSize(Size::new(320.0, 1000.0)));
        surface.emit(Signal::ContentSize(Size::new(320.0, 1000.0)));
        surface.emit(Signal::Offset(Point::ZERO));

        assert_eq!(recorded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_viewport_is_read_from_surface() {
        let surface = Arc::new(TestSurface::default());
        let (_observer, recorded) = observe(&surface);

        lock(&surface.snapshot).viewport_size = Size::new(320.0, 600.0);
        surface.emit(Signal::Offset(Point::new(0.0, 5.0)));

        let recorded = recorded.lock().unwrap();
        let diff = recorded[0].0.diff(&recorded[0].1);
        assert!(diff.offset_changed);
        assert!(diff.viewport_changed);
        assert!(diff.layout_changed());
        assert!(!diff.drag_phase_changed);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let surface = Arc::new(TestSurface::default());
        let (mut observer, recorded) = observe(&surface);

        observer.detach();
        observer.detach();
        assert!(!observer.is_observing());
        assert_eq!(surface.listener_count(), 0);

        surface.emit(Signal::Offset(Point::new(0.0, 1.0)));
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let surface = Arc::new(TestSurface::default());
        let (observer, _recorded) = observe(&surface);
        drop(observer);
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_dropped_surface_never_relays() {
        let surface = Arc::new(TestSurface::default());
        let (mut observer, recorded) = observe(&surface);

        drop(surface);
        observer.detach();

        assert!(!observer.is_observing());
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_try_attach_gone_surface() {
        let surface: Arc<dyn ScrollSurface> = Arc::new(TestSurface::default());
        let weak = Arc::downgrade(&surface);
        drop(surface);

        let result = ScrollSignalObserver::try_attach(&weak, |_, _| {});
        assert!(matches!(result, Err(RiffleError::SurfaceGone)));
    }
}
