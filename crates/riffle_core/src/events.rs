//! Scroll signals
//!
//! The three kinds of change a surface reports to its listeners, and the
//! gesture lifecycle carried by drag-phase signals.

/// Gesture lifecycle reported by the surface's pan recognizer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DragPhase {
    /// No gesture in progress (recognizer is waiting)
    #[default]
    Possible,
    /// Finger down and movement recognized
    Began,
    /// Finger moved
    Changed,
    /// Finger lifted
    Ended,
    /// Gesture interrupted by the system
    Cancelled,
}

impl DragPhase {
    /// Check if a finger is currently on the surface
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragPhase::Began | DragPhase::Changed)
    }
}

/// Which surface property a listener observes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Content offset moved
    Offset,
    /// Content size changed (layout)
    ContentSize,
    /// Drag phase changed
    DragPhase,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [
        SignalKind::Offset,
        SignalKind::ContentSize,
        SignalKind::DragPhase,
    ];
}

/// A single property change delivered to a listener
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Signal {
    Offset(crate::Point),
    ContentSize(crate::Size),
    DragPhase(DragPhase),
}

impl Signal {
    /// The kind of listener this signal is delivered to
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::Offset(_) => SignalKind::Offset,
            Signal::ContentSize(_) => SignalKind::ContentSize,
            Signal::DragPhase(_) => SignalKind::DragPhase,
        }
    }
}
