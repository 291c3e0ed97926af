//! Header and footer capability contracts
//!
//! Riffle never draws anything. The host supplies widgets that know their
//! own size and react to state changes; the controllers position them on
//! the surface by [`ViewId`].

use std::fmt;

use riffle_core::{Insets, Size, ViewId};

use crate::load_more::LoadMoreState;
use crate::refresh::RefreshState;

/// A pull-to-refresh header
pub trait RefreshHeader: Send + Sync {
    /// Identity of the header's view on the surface
    fn view_id(&self) -> ViewId;

    /// Size of the header's view
    fn size(&self) -> Size;

    /// Margin reserved around the header
    fn edge_insets(&self) -> Insets {
        Insets::ZERO
    }

    fn on_refresh_state_changed(&self, previous: RefreshState, next: RefreshState);
}

/// An infinite-load footer
pub trait LoadMoreFooter: Send + Sync {
    /// Identity of the footer's view on the surface
    fn view_id(&self) -> ViewId;

    /// Size of the footer's view
    fn size(&self) -> Size;

    /// Fraction of a viewport height before the bottom at which loading starts
    fn preload(&self) -> f32 {
        0.0
    }

    /// Keep the footer (and its space) on screen once exhausted
    fn is_visible_when_exhausted(&self) -> bool {
        true
    }

    /// Margin reserved around the footer
    fn edge_insets(&self) -> Insets {
        Insets::ZERO
    }

    fn on_load_more_state_changed(&self, previous: LoadMoreState, next: LoadMoreState);
}

type ControlAction = Box<dyn Fn() + Send + Sync>;

/// Adapts a platform refresh control (a spinner with begin/end calls) to
/// the [`RefreshHeader`] contract.
///
/// The control starts on `Idle -> Active` (a programmatic begin) and stops
/// on `Active -> Idle`. A pull released into `Active` does not start it:
/// the platform control is already spinning from its own pull.
pub struct SystemRefreshControl {
    view: ViewId,
    size: Size,
    begin: ControlAction,
    end: ControlAction,
}

impl SystemRefreshControl {
    pub fn new<B, E>(view: ViewId, size: Size, begin: B, end: E) -> Self
    where
        B: Fn() + Send + Sync + 'static,
        E: Fn() + Send + Sync + 'static,
    {
        Self {
            view,
            size,
            begin: Box::new(begin),
            end: Box::new(end),
        }
    }
}

impl RefreshHeader for SystemRefreshControl {
    fn view_id(&self) -> ViewId {
        self.view
    }

    fn size(&self) -> Size {
        self.size
    }

    fn on_refresh_state_changed(&self, previous: RefreshState, next: RefreshState) {
        match (previous, next) {
            (RefreshState::Idle, RefreshState::Active) => (self.begin)(),
            (RefreshState::Active, RefreshState::Idle) => (self.end)(),
            _ => {}
        }
    }
}

impl fmt::Debug for SystemRefreshControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemRefreshControl")
            .field("view", &self.view)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_system_control_follows_programmatic_edges() {
        let begins = Arc::new(AtomicUsize::new(0));
        let ends = Arc::new(AtomicUsize::new(0));
        let (b, e) = (begins.clone(), ends.clone());

        let control = SystemRefreshControl::new(
            ViewId(1),
            Size::new(320.0, 60.0),
            move || {
                b.fetch_add(1, Ordering::SeqCst);
            },
            move || {
                e.fetch_add(1, Ordering::SeqCst);
            },
        );

        control.on_refresh_state_changed(RefreshState::Idle, RefreshState::Pulling(0.5));
        control.on_refresh_state_changed(RefreshState::Idle, RefreshState::Active);
        control.on_refresh_state_changed(RefreshState::Pulling(1.2), RefreshState::Active);
        control.on_refresh_state_changed(RefreshState::Active, RefreshState::Idle);

        assert_eq!(begins.load(Ordering::SeqCst), 1);
        assert_eq!(ends.load(Ordering::SeqCst), 1);
        assert_eq!(control.edge_insets(), Insets::ZERO);
    }
}
