//! Riffle Core
//!
//! This crate provides the foundational primitives for Riffle's
//! pull-to-refresh and load-more controllers:
//!
//! - **Geometry**: points, sizes, rects, and content insets
//! - **Surface contract**: the [`ScrollSurface`] trait a host's scroll view implements
//! - **Signal observation**: [`ScrollSignalObserver`] diffs offset, size, and drag-phase changes
//! - **State Machines**: value-guarded machines for payload-carrying interaction states
//!
//! # Example
//!
//! ```rust
//! use riffle_core::fsm::{StateMachine, StateTransitions};
//!
//! #[derive(Clone, Copy, Debug, PartialEq)]
//! enum Progress {
//!     Idle,
//!     Partial(f32),
//! }
//!
//! impl StateTransitions for Progress {
//!     type Input = f32;
//!
//!     fn on_input(&self, fraction: &f32) -> Option<Self> {
//!         Some(if *fraction > 0.0 { Progress::Partial(*fraction) } else { Progress::Idle })
//!     }
//! }
//!
//! let mut fsm = StateMachine::new(Progress::Idle);
//! assert!(fsm.send(&0.5).is_some());
//! assert!(fsm.send(&0.5).is_none());
//! ```

pub mod error;
pub mod events;
pub mod fsm;
pub mod geometry;
pub mod observer;
pub mod surface;
pub mod sync;

pub use error::{Result, RiffleError};
pub use events::{DragPhase, Signal, SignalKind};
pub use fsm::{StateMachine, StateTransitions};
pub use geometry::{Edge, Insets, Point, Rect, Size};
pub use observer::{ScrollSignalObserver, ScrollSnapshot, SnapshotDiff};
pub use surface::{AnimationCompletion, Listener, ListenerId, ScrollSurface, ViewId};
