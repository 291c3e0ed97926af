//! Scroll surface collaborator
//!
//! [`ScrollSurface`] is the contract between Riffle and the host's
//! scrollable view. Riffle only ever borrows a surface through a `Weak`
//! reference; the host owns it.
//!
//! All methods take `&self`: implementations keep their mutable state
//! behind interior mutability and must not hold internal locks while
//! invoking listeners or animation completions, since those callbacks may
//! write back to the surface.

use std::time::Duration;

use slotmap::new_key_type;

use crate::events::{DragPhase, Signal, SignalKind};
use crate::geometry::{Edge, Insets, Point, Rect, Size};
use crate::observer::ScrollSnapshot;

new_key_type! {
    /// Handle returned by [`ScrollSurface::subscribe`]
    pub struct ListenerId;
}

/// Change listener registered on a surface
pub type Listener = Box<dyn Fn(Signal) + Send + Sync>;

/// Called once an inset animation stops; `true` if it reached its target,
/// `false` if a newer request for the same edge superseded it
pub type AnimationCompletion = Box<dyn FnOnce(bool) + Send>;

/// Host-assigned identity of a header or footer view
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// The scrollable view being augmented
pub trait ScrollSurface: Send + Sync {
    /// Current content offset
    fn content_offset(&self) -> Point;

    /// Current content size
    fn content_size(&self) -> Size;

    /// Viewport bounds
    fn bounds(&self) -> Rect;

    /// Currently applied content insets
    fn insets(&self) -> Insets;

    /// Current drag phase of the pan gesture
    fn drag_phase(&self) -> DragPhase;

    /// Write one inset edge immediately
    fn set_inset(&self, edge: Edge, value: f32);

    /// Animate one inset edge to `value`
    ///
    /// A newer request for the same edge replaces an in-flight one
    /// (last-write-wins); the replaced request's completion receives
    /// `false`.
    fn animate_inset(
        &self,
        edge: Edge,
        value: f32,
        duration: Duration,
        completion: AnimationCompletion,
    );

    /// Register a listener for one kind of change
    fn subscribe(&self, kind: SignalKind, listener: Listener) -> ListenerId;

    /// Remove a listener; returns false if it was not registered
    fn unsubscribe(&self, id: ListenerId) -> bool;

    /// Attach a child view at an absolute frame in content coordinates
    fn insert_child(&self, view: ViewId, frame: Rect);

    /// Move an attached child
    fn set_child_frame(&self, view: ViewId, frame: Rect);

    /// Show or hide an attached child without detaching it
    fn set_child_hidden(&self, view: ViewId, hidden: bool);

    /// Detach a child
    fn remove_child(&self, view: ViewId);

    /// Check if a child is currently attached
    fn contains_child(&self, view: ViewId) -> bool;

    /// Read every observed property at once
    fn snapshot(&self) -> ScrollSnapshot {
        ScrollSnapshot {
            offset: self.content_offset(),
            content_size: self.content_size(),
            viewport_size: self.bounds().size,
            drag_phase: self.drag_phase(),
        }
    }
}
