//! Load-more controller
//!
//! Drives a footer below a surface's content:
//!
//! ```text
//!   Idle ──near bottom──► Active ──end_refreshing(false)──► Idle
//!                           │
//!                           └──end_refreshing(true)──► Exhausted ──reset()──► Idle
//! ```
//!
//! `no_more()` forces `Exhausted` from any state and `reset()` forces
//! `Idle`. Only `Idle` watches the offset or accepts `begin_refreshing()`,
//! so an exhausted list never loads again until it is reset.
//!
//! Transitions committed from inside a side effect (a surface that emits
//! while an inset is written, a trigger that ends loading synchronously)
//! are queued and applied after the current one, in commit order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use riffle_core::fsm::{StateMachine, StateTransitions};
use riffle_core::sync::lock;
use riffle_core::{
    AnimationCompletion, Edge, Insets, Rect, Result, ScrollSignalObserver, ScrollSnapshot,
    ScrollSurface, Size,
};

use crate::config::ControllerConfig;
use crate::widget::LoadMoreFooter;
use crate::Trigger;

/// Interaction state of an infinite-load footer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoadMoreState {
    /// Waiting for the offset to approach the bottom
    #[default]
    Idle,
    /// Loading; the footer and its space are shown
    Active,
    /// Nothing more to load
    Exhausted,
}

/// Inputs that drive [`LoadMoreState`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadMoreInput {
    /// Offset moved; `fraction` from [`load_fraction`]
    Scrolled { fraction: f32, preload: f32 },
    /// Programmatic begin
    Begin,
    /// Loading finished
    End { no_more: bool },
    /// Back to `Idle` from anywhere
    Reset,
    /// To `Exhausted` from anywhere
    NoMore,
}

impl StateTransitions for LoadMoreState {
    type Input = LoadMoreInput;

    fn on_input(&self, input: &LoadMoreInput) -> Option<Self> {
        match (self, input) {
            (LoadMoreState::Idle, LoadMoreInput::Scrolled { fraction, preload }) => {
                (fraction.is_finite() && fraction - preload <= 0.0).then_some(LoadMoreState::Active)
            }
            (_, LoadMoreInput::Scrolled { .. }) => None,
            // Only reset() leaves Exhausted
            (LoadMoreState::Idle, LoadMoreInput::Begin) => Some(LoadMoreState::Active),
            (_, LoadMoreInput::Begin) => None,
            (LoadMoreState::Active, LoadMoreInput::End { no_more }) => Some(if *no_more {
                LoadMoreState::Exhausted
            } else {
                LoadMoreState::Idle
            }),
            (_, LoadMoreInput::End { .. }) => None,
            (_, LoadMoreInput::Reset) => Some(LoadMoreState::Idle),
            (_, LoadMoreInput::NoMore) => Some(LoadMoreState::Exhausted),
        }
    }
}

/// Distance left to the bottom edge, in viewport heights
///
/// `(content_height + bottom_inset - offset_y) / viewport_height - 1`.
/// Zero or less means the bottom edge is visible. Returns `None` for
/// degenerate layouts (empty content, zero-height viewport), which never
/// trigger loading.
pub fn load_fraction(
    offset_y: f32,
    content_height: f32,
    bottom_inset: f32,
    viewport_height: f32,
) -> Option<f32> {
    if content_height <= 0.0 || viewport_height <= 0.0 {
        return None;
    }
    let topside = content_height + bottom_inset;
    let fraction = (topside - offset_y) / viewport_height - 1.0;
    fraction.is_finite().then_some(fraction)
}

/// Frame of a footer sitting just below the content
pub fn footer_frame(
    viewport_width: f32,
    footer_size: Size,
    edge_insets: Insets,
    content_height: f32,
    original_bottom: f32,
) -> Rect {
    let x = (viewport_width - footer_size.width) / 2.0 + (edge_insets.right - edge_insets.left);
    let topside = content_height + original_bottom;
    Rect::new(
        x,
        topside + edge_insets.top,
        footer_size.width,
        footer_size.height,
    )
}

#[derive(Clone, Copy, Debug)]
enum Cause {
    Offset(f32),
    Begin,
    End { no_more: bool },
    Reset,
    NoMore,
}

struct LoadMoreInner {
    machine: StateMachine<LoadMoreState>,
    footer: Option<Arc<dyn LoadMoreFooter>>,
    on_trigger: Option<Trigger>,
    config: ControllerConfig,
    /// Insets captured when bottom space was first reserved
    original: Option<Insets>,
    generation: u64,
    /// Committed transitions whose side effects have not run yet
    pending: VecDeque<Step>,
    /// Set while a dispatch is applying `pending`
    draining: bool,
}

impl LoadMoreInner {
    /// Whether the current state shows the footer
    fn shows_footer(&self) -> bool {
        match self.machine.current_state() {
            LoadMoreState::Active => true,
            LoadMoreState::Exhausted => self.config.keep_space_when_exhausted,
            LoadMoreState::Idle => false,
        }
    }
}

struct Step {
    previous: LoadMoreState,
    next: LoadMoreState,
    footer: Arc<dyn LoadMoreFooter>,
    trigger: Option<Trigger>,
    config: ControllerConfig,
}

/// Load-more controller for one surface
pub struct LoadMoreController {
    surface: Weak<dyn ScrollSurface>,
    this: Weak<LoadMoreController>,
    inner: Mutex<LoadMoreInner>,
    observer: Mutex<Option<ScrollSignalObserver>>,
}

impl LoadMoreController {
    /// Create a controller and start observing `surface`
    pub fn attach(surface: &Arc<dyn ScrollSurface>) -> Arc<Self> {
        Arc::new_cyclic(|this: &Weak<Self>| {
            let handle = this.clone();
            let observer = ScrollSignalObserver::attach(surface, move |previous, next| {
                if let Some(controller) = handle.upgrade() {
                    controller.on_snapshot(previous, next);
                }
            });

            Self {
                surface: Arc::downgrade(surface),
                this: this.clone(),
                inner: Mutex::new(LoadMoreInner {
                    machine: StateMachine::new(LoadMoreState::Idle),
                    footer: None,
                    on_trigger: None,
                    config: ControllerConfig::default(),
                    original: None,
                    generation: 0,
                    pending: VecDeque::new(),
                    draining: false,
                }),
                observer: Mutex::new(Some(observer)),
            }
        })
    }

    /// Install the footer and the callback fired on every entry into `Active`
    pub fn setup<F>(&self, footer: Arc<dyn LoadMoreFooter>, on_trigger: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let config = ControllerConfig::for_footer(&*footer);
        self.setup_with_config(footer, config, on_trigger)
    }

    /// Like [`setup`](Self::setup) with an explicit configuration
    pub fn setup_with_config<F>(
        &self,
        footer: Arc<dyn LoadMoreFooter>,
        config: ControllerConfig,
        on_trigger: F,
    ) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        config.validate()?;

        let view = footer.view_id();
        let replaced = {
            let mut inner = lock(&self.inner);
            inner.config = config;
            inner.on_trigger = Some(Arc::new(on_trigger));
            inner.footer.replace(footer)
        };

        if let Some(old) = replaced.filter(|old| old.view_id() != view) {
            if let Some(surface) = self.surface.upgrade() {
                surface.remove_child(old.view_id());
            }
        }

        tracing::debug!(?view, preload = config.preload_fraction, "Load-more footer installed");
        Ok(())
    }

    /// Start loading without waiting for the offset
    ///
    /// Ignored unless `Idle`; an exhausted list has to be reset first.
    pub fn begin_refreshing(&self) {
        self.dispatch(Cause::Begin);
    }

    /// Finish loading; `no_more` moves to `Exhausted` instead of `Idle`
    pub fn end_refreshing(&self, no_more: bool) {
        self.dispatch(Cause::End { no_more });
    }

    /// Return to `Idle`, re-enabling offset-driven loading
    pub fn reset(&self) {
        self.dispatch(Cause::Reset);
    }

    /// Mark the list as exhausted
    pub fn no_more(&self) {
        self.dispatch(Cause::NoMore);
    }

    pub fn state(&self) -> LoadMoreState {
        *lock(&self.inner).machine.current_state()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state() == LoadMoreState::Active
    }

    pub fn is_exhausted(&self) -> bool {
        self.state() == LoadMoreState::Exhausted
    }

    /// Recent `(previous, next)` transitions, oldest first
    pub fn history(&self) -> Vec<(LoadMoreState, LoadMoreState)> {
        lock(&self.inner).machine.history().copied().collect()
    }

    /// Insets captured when bottom space was reserved, until it is released
    pub fn original_insets(&self) -> Option<Insets> {
        lock(&self.inner).original
    }

    pub fn is_observing(&self) -> bool {
        lock(&self.observer)
            .as_ref()
            .is_some_and(ScrollSignalObserver::is_observing)
    }

    /// Stop observing the surface. Safe to call any number of times.
    pub fn detach(&self) {
        let observer = lock(&self.observer).take();
        drop(observer);
    }

    fn on_snapshot(&self, previous: &ScrollSnapshot, next: &ScrollSnapshot) {
        let diff = previous.diff(next);

        if diff.layout_changed() {
            self.reposition();
        }
        if diff.offset_changed {
            self.dispatch(Cause::Offset(next.offset.y));
        }
    }

    /// Follow the content's bottom edge without changing state
    fn reposition(&self) {
        let Some(surface) = self.surface.upgrade() else {
            return;
        };
        let (footer, config, original) = {
            let inner = lock(&self.inner);
            let Some(footer) = inner.footer.clone() else {
                return;
            };
            (footer, inner.config, inner.original)
        };

        let view = footer.view_id();
        if !surface.contains_child(view) {
            return;
        }

        let bottom = original.map_or_else(|| surface.insets().bottom, |o| o.bottom);
        let frame = footer_frame(
            surface.bounds().width(),
            footer.size(),
            config.edge_insets,
            surface.content_size().height,
            bottom,
        );
        tracing::trace!(?frame, "Repositioning load-more footer");
        surface.set_child_frame(view, frame);
    }

    fn dispatch(&self, cause: Cause) {
        let Some(surface) = self.surface.upgrade() else {
            tracing::warn!(?cause, "Load-more surface is gone, ignoring");
            return;
        };

        {
            let mut inner = lock(&self.inner);
            let Some(footer) = inner.footer.clone() else {
                if !matches!(cause, Cause::Offset(_)) {
                    tracing::warn!(?cause, "Load-more triggered before setup, ignoring");
                }
                return;
            };

            let input = match cause {
                Cause::Offset(offset_y) => {
                    if !inner.machine.is_in(&LoadMoreState::Idle) {
                        return;
                    }
                    let snapshot = surface.snapshot();
                    let Some(fraction) = load_fraction(
                        offset_y,
                        snapshot.content_size.height,
                        surface.insets().bottom,
                        snapshot.viewport_size.height,
                    ) else {
                        return;
                    };
                    tracing::trace!(offset_y, fraction, "Load fraction");
                    LoadMoreInput::Scrolled {
                        fraction,
                        preload: inner.config.preload_fraction,
                    }
                }
                Cause::Begin => {
                    if inner.machine.is_in(&LoadMoreState::Exhausted) {
                        tracing::warn!("begin_refreshing called while exhausted, reset first");
                    }
                    LoadMoreInput::Begin
                }
                Cause::End { no_more } => {
                    if !inner.machine.is_in(&LoadMoreState::Active) {
                        tracing::warn!(no_more, "end_refreshing called while not loading");
                    }
                    LoadMoreInput::End { no_more }
                }
                Cause::Reset => LoadMoreInput::Reset,
                Cause::NoMore => LoadMoreInput::NoMore,
            };

            let Some((previous, next)) = inner.machine.send(&input) else {
                return;
            };
            tracing::debug!(?previous, ?next, "Load-more state changed");

            let step = Step {
                previous,
                next,
                footer,
                trigger: inner.on_trigger.clone(),
                config: inner.config,
            };
            inner.pending.push_back(step);
            if inner.draining {
                return;
            }
            inner.draining = true;
        }

        self.drain(&*surface);
    }

    /// Apply committed steps in commit order
    ///
    /// Side effects may re-enter `dispatch` through the surface; those
    /// transitions are queued and applied here once the current one is done.
    fn drain(&self, surface: &dyn ScrollSurface) {
        loop {
            let step = {
                let mut inner = lock(&self.inner);
                match inner.pending.pop_front() {
                    Some(step) => step,
                    None => {
                        inner.draining = false;
                        return;
                    }
                }
            };
            self.apply(surface, step);
        }
    }

    fn apply(&self, surface: &dyn ScrollSurface, step: Step) {
        let Step {
            previous,
            next,
            footer,
            trigger,
            config,
        } = step;

        let keep = match next {
            LoadMoreState::Active => true,
            LoadMoreState::Exhausted => config.keep_space_when_exhausted,
            LoadMoreState::Idle => false,
        };
        if keep {
            self.reserve(surface, &*footer, &config);
        } else {
            self.release(surface, &*footer, &config);
        }

        footer.on_load_more_state_changed(previous, next);

        if next == LoadMoreState::Active {
            if let Some(trigger) = trigger {
                trigger();
            }
        }
    }

    /// Show the footer below the content and reserve bottom space for it
    fn reserve(
        &self,
        surface: &dyn ScrollSurface,
        footer: &dyn LoadMoreFooter,
        config: &ControllerConfig,
    ) {
        let view = footer.view_id();
        let original = {
            let mut inner = lock(&self.inner);
            // Supersede any pending release
            inner.generation += 1;
            *inner.original.get_or_insert_with(|| surface.insets())
        };

        let frame = footer_frame(
            surface.bounds().width(),
            footer.size(),
            config.edge_insets,
            surface.content_size().height,
            original.bottom,
        );
        if surface.contains_child(view) {
            surface.set_child_frame(view, frame);
        } else {
            tracing::debug!(?view, ?frame, "Attaching load-more footer");
            surface.insert_child(view, frame);
        }
        surface.set_child_hidden(view, false);

        let reserved = original.bottom + config.outset_height(footer.size().height);
        tracing::debug!(reserved, "Reserving bottom inset");
        surface.set_inset(Edge::Bottom, reserved);
    }

    /// Give the bottom space back, hiding the footer once the inset settles
    fn release(
        &self,
        surface: &dyn ScrollSurface,
        footer: &dyn LoadMoreFooter,
        config: &ControllerConfig,
    ) {
        let (original, generation) = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            (inner.original, inner.generation)
        };

        let Some(original) = original else {
            let view = footer.view_id();
            if surface.contains_child(view) {
                surface.set_child_hidden(view, true);
            }
            return;
        };

        let this = self.this.clone();
        let completion: AnimationCompletion = Box::new(move |finished| {
            if let Some(controller) = this.upgrade() {
                controller.finish_release(generation, finished);
            }
        });

        tracing::debug!(value = original.bottom, generation, "Releasing bottom inset");
        surface.animate_inset(
            Edge::Bottom,
            original.bottom,
            config.animation_duration(),
            completion,
        );
    }

    fn finish_release(&self, generation: u64, finished: bool) {
        if !finished {
            tracing::trace!(generation, "Bottom inset release superseded");
            return;
        }
        let Some(surface) = self.surface.upgrade() else {
            return;
        };

        let view = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation || inner.shows_footer() {
                return;
            }
            inner.original = None;
            inner.footer.as_ref().map(|footer| footer.view_id())
        };

        if let Some(view) = view.filter(|view| surface.contains_child(*view)) {
            tracing::debug!(?view, "Hiding load-more footer");
            surface.set_child_hidden(view, true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrolled(fraction: f32) -> LoadMoreInput {
        LoadMoreInput::Scrolled {
            fraction,
            preload: 0.0,
        }
    }

    #[test]
    fn test_bottom_edge_triggers() {
        let mut fsm = StateMachine::new(LoadMoreState::Idle);
        assert_eq!(fsm.send(&scrolled(0.5)), None);
        assert_eq!(
            fsm.send(&scrolled(0.0)),
            Some((LoadMoreState::Idle, LoadMoreState::Active))
        );
        // Already loading
        assert_eq!(fsm.send(&scrolled(-1.0)), None);
    }

    #[test]
    fn test_preload_triggers_early() {
        let mut fsm = StateMachine::new(LoadMoreState::Idle);
        let input = LoadMoreInput::Scrolled {
            fraction: 0.4,
            preload: 0.5,
        };
        assert!(fsm.send(&input).is_some());
    }

    #[test]
    fn test_nan_fraction_never_triggers() {
        let fsm = StateMachine::new(LoadMoreState::Idle);
        assert!(!fsm.can_send(&scrolled(f32::NAN)));
        assert!(!fsm.can_send(&scrolled(f32::NEG_INFINITY)));
    }

    #[test]
    fn test_end_and_exhaustion() {
        let mut fsm = StateMachine::new(LoadMoreState::Idle);
        assert_eq!(fsm.send(&LoadMoreInput::End { no_more: true }), None);

        fsm.send(&LoadMoreInput::Begin);
        assert_eq!(
            fsm.send(&LoadMoreInput::End { no_more: true }),
            Some((LoadMoreState::Active, LoadMoreState::Exhausted))
        );
        // Exhausted ignores the offset
        assert_eq!(fsm.send(&scrolled(-1.0)), None);
        assert_eq!(
            fsm.send(&LoadMoreInput::Reset),
            Some((LoadMoreState::Exhausted, LoadMoreState::Idle))
        );
    }

    #[test]
    fn test_begin_does_not_leave_exhausted() {
        let mut fsm = StateMachine::new(LoadMoreState::Exhausted);
        assert_eq!(fsm.send(&LoadMoreInput::Begin), None);

        fsm.send(&LoadMoreInput::Reset);
        assert_eq!(
            fsm.send(&LoadMoreInput::Begin),
            Some((LoadMoreState::Idle, LoadMoreState::Active))
        );
    }

    #[test]
    fn test_no_more_from_anywhere() {
        for initial in [LoadMoreState::Idle, LoadMoreState::Active] {
            let mut fsm = StateMachine::new(initial);
            assert_eq!(
                fsm.send(&LoadMoreInput::NoMore),
                Some((initial, LoadMoreState::Exhausted))
            );
        }
    }

    #[test]
    fn test_load_fraction() {
        // 2000 tall content in a 600 viewport
        assert_eq!(load_fraction(0.0, 2000.0, 0.0, 600.0), Some(2000.0 / 600.0 - 1.0));
        assert_eq!(load_fraction(1400.0, 2000.0, 0.0, 600.0), Some(0.0));
        assert!(load_fraction(1000.0, 2000.0, 0.0, 600.0).unwrap() > 0.0);
        // Bottom inset pushes the edge further down
        assert!(load_fraction(1400.0, 2000.0, 50.0, 600.0).unwrap() > 0.0);
    }

    #[test]
    fn test_short_content_is_already_at_bottom() {
        // 580 tall content in a 600 viewport
        let fraction = load_fraction(30.0, 580.0, 0.0, 600.0).unwrap();
        assert!(fraction < 0.0);

        let fsm = StateMachine::new(LoadMoreState::Idle);
        assert!(fsm.can_send(&scrolled(fraction)));
    }

    #[test]
    fn test_load_fraction_degenerate() {
        assert_eq!(load_fraction(0.0, 1000.0, 0.0, 0.0), None);
        assert_eq!(load_fraction(0.0, 0.0, 0.0, 600.0), None);
    }

    #[test]
    fn test_footer_frame() {
        let frame = footer_frame(
            320.0,
            Size::new(320.0, 50.0),
            Insets::new(5.0, 0.0, 5.0, 0.0),
            580.0,
            10.0,
        );
        assert_eq!(frame, Rect::new(0.0, 595.0, 320.0, 50.0));
    }
}
