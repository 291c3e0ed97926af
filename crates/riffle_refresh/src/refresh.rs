//! Pull-to-refresh controller
//!
//! Drives a header above a surface's top edge through three states:
//!
//! ```text
//!            offset pulled down             release with fraction >= 1
//!   Idle ─────────────────────────► Pulling(f) ─────────────────────────► Active
//!    ▲  ◄───────────────────────────    │                                   │
//!    │   offset back / layout / early   │                                   │
//!    │   release                        │                                   │
//!    └──────────────────────────────────┴───────── end_refreshing() ◄───────┘
//! ```
//!
//! Transitions are computed by the pure [`StateTransitions`] impl on
//! [`RefreshState`]; the controller only turns snapshot diffs into
//! [`RefreshInput`]s and applies side effects (header placement, top inset,
//! widget notification, trigger callback) after each change.
//!
//! Side effects run with no controller lock held, so the surface may
//! deliver new signals synchronously while an inset is written and the
//! trigger callback may call [`RefreshController::end_refreshing`] directly.
//! Transitions committed from inside a side effect are queued and applied
//! after the current one, so the header sees them in commit order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Weak};

use riffle_core::fsm::{StateMachine, StateTransitions};
use riffle_core::sync::lock;
use riffle_core::{
    AnimationCompletion, DragPhase, Edge, Insets, Rect, Result, ScrollSignalObserver,
    ScrollSnapshot, ScrollSurface, Size,
};
use smallvec::SmallVec;

use crate::config::ControllerConfig;
use crate::widget::RefreshHeader;
use crate::Trigger;

/// Interaction state of a pull-to-refresh header
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RefreshState {
    /// Header hidden, nothing reserved
    #[default]
    Idle,
    /// Header partly revealed; 1.0 is the trigger threshold, larger values
    /// are overscroll
    Pulling(f32),
    /// Header fully revealed and the refresh callback has fired
    Active,
}

impl RefreshState {
    pub fn is_active(&self) -> bool {
        matches!(self, RefreshState::Active)
    }

    /// Pull progress, or `None` outside `Pulling`
    pub fn fraction(&self) -> Option<f32> {
        match self {
            RefreshState::Pulling(fraction) => Some(*fraction),
            _ => None,
        }
    }
}

/// Inputs that drive [`RefreshState`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RefreshInput {
    /// Content size or viewport changed
    LayoutChanged,
    /// Offset moved; `fraction` from [`pull_fraction`]
    Scrolled { fraction: f32 },
    /// The finger lifted
    DragEnded,
    /// Programmatic begin
    Begin,
    /// Programmatic end
    End,
}

impl StateTransitions for RefreshState {
    type Input = RefreshInput;

    fn on_input(&self, input: &RefreshInput) -> Option<Self> {
        match (self, input) {
            (_, RefreshInput::Begin) => Some(RefreshState::Active),
            (_, RefreshInput::End) => Some(RefreshState::Idle),
            // Only programmatic inputs move an active refresh
            (RefreshState::Active, _) => None,
            (_, RefreshInput::LayoutChanged) => Some(RefreshState::Idle),
            (_, RefreshInput::Scrolled { fraction }) => Some(if *fraction > 0.0 {
                RefreshState::Pulling(*fraction)
            } else {
                RefreshState::Idle
            }),
            (RefreshState::Pulling(fraction), RefreshInput::DragEnded) => {
                Some(if *fraction >= 1.0 {
                    RefreshState::Active
                } else {
                    RefreshState::Idle
                })
            }
            (RefreshState::Idle, RefreshInput::DragEnded) => None,
        }
    }
}

/// Pull progress for a content offset
///
/// `(offset_y + original_top) / -outset_height`, with negative and
/// non-finite results (zero-height header, NaN offsets) reported as 0.
pub fn pull_fraction(offset_y: f32, original_top: f32, outset_height: f32) -> f32 {
    let fraction = (offset_y + original_top) / -outset_height;
    if fraction.is_finite() && fraction > 0.0 {
        fraction
    } else {
        0.0
    }
}

/// Frame of a header sitting just above the original top edge
pub fn header_frame(
    viewport_width: f32,
    header_size: Size,
    edge_insets: Insets,
    original_top: f32,
) -> Rect {
    let outset = header_size.height + edge_insets.vertical();
    let x = (viewport_width - header_size.width) / 2.0 + (edge_insets.right - edge_insets.left);
    let topside = -original_top - outset;
    Rect::new(
        x,
        topside + edge_insets.top,
        header_size.width,
        header_size.height,
    )
}

#[derive(Clone, Copy, Debug)]
enum Cause {
    Layout,
    Offset(f32),
    Released,
    Begin,
    End,
}

struct RefreshInner {
    machine: StateMachine<RefreshState>,
    header: Option<Arc<dyn RefreshHeader>>,
    on_trigger: Option<Trigger>,
    config: ControllerConfig,
    /// Insets captured when the header was first revealed
    original: Option<Insets>,
    /// Bumped on every top-inset animation; a restore only detaches the
    /// header if nothing newer was requested
    generation: u64,
    /// Committed transitions whose side effects have not run yet
    pending: VecDeque<Step>,
    /// Set while a dispatch is applying `pending`
    draining: bool,
}

/// A committed transition waiting for its side effects
struct Step {
    previous: RefreshState,
    next: RefreshState,
    header: Arc<dyn RefreshHeader>,
    trigger: Option<Trigger>,
    config: ControllerConfig,
}

/// Pull-to-refresh controller for one surface
pub struct RefreshController {
    surface: Weak<dyn ScrollSurface>,
    this: Weak<RefreshController>,
    inner: Mutex<RefreshInner>,
    observer: Mutex<Option<ScrollSignalObserver>>,
}

impl RefreshController {
    /// Create a controller and start observing `surface`
    ///
    /// The controller holds the surface weakly.
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
                inner: Mutex::new(RefreshInner {
                    machine: StateMachine::new(RefreshState::Idle),
                    header: None,
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

    /// Install the header and the callback fired on every entry into `Active`
    pub fn setup<F>(&self, header: Arc<dyn RefreshHeader>, on_trigger: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let config = ControllerConfig::for_header(&*header);
        self.setup_with_config(header, config, on_trigger)
    }

    /// Like [`setup`](Self::setup) with an explicit configuration
    pub fn setup_with_config<F>(
        &self,
        header: Arc<dyn RefreshHeader>,
        config: ControllerConfig,
        on_trigger: F,
    ) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        config.validate()?;

        let view = header.view_id();
        let replaced = {
            let mut inner = lock(&self.inner);
            inner.config = config;
            inner.on_trigger = Some(Arc::new(on_trigger));
            inner.header.replace(header)
        };

        if let Some(old) = replaced.filter(|old| old.view_id() != view) {
            if let Some(surface) = self.surface.upgrade() {
                surface.remove_child(old.view_id());
            }
        }

        tracing::debug!(?view, "Refresh header installed");
        Ok(())
    }

    /// Force `Active`, whatever the drag phase
    pub fn begin_refreshing(&self) {
        self.dispatch(Cause::Begin);
    }

    /// Force `Idle`
    pub fn end_refreshing(&self) {
        self.dispatch(Cause::End);
    }

    pub fn state(&self) -> RefreshState {
        *lock(&self.inner).machine.current_state()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state().is_active()
    }

    /// Recent `(previous, next)` transitions, oldest first
    pub fn history(&self) -> Vec<(RefreshState, RefreshState)> {
        lock(&self.inner).machine.history().copied().collect()
    }

    /// Insets captured when the header was revealed, until it is hidden again
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
        let mut causes: SmallVec<[Cause; 3]> = SmallVec::new();

        if diff.layout_changed() {
            causes.push(Cause::Layout);
        }
        if diff.offset_changed {
            causes.push(Cause::Offset(next.offset.y));
        }
        if diff.drag_phase_changed && next.drag_phase == DragPhase::Ended {
            causes.push(Cause::Released);
        }

        for cause in causes {
            self.dispatch(cause);
        }
    }

    fn dispatch(&self, cause: Cause) {
        let Some(surface) = self.surface.upgrade() else {
            tracing::warn!(?cause, "Refresh surface is gone, ignoring");
            return;
        };

        {
            let mut inner = lock(&self.inner);
            let Some(header) = inner.header.clone() else {
                if matches!(cause, Cause::Begin | Cause::End) {
                    tracing::warn!(?cause, "Refresh triggered before setup, ignoring");
                }
                return;
            };

            let input = match cause {
                Cause::Layout => RefreshInput::LayoutChanged,
                Cause::Offset(offset_y) => {
                    let top = inner
                        .original
                        .map_or_else(|| surface.insets().top, |original| original.top);
                    let outset = inner.config.outset_height(header.size().height);
                    let fraction = pull_fraction(offset_y, top, outset);
                    tracing::trace!(offset_y, fraction, "Pull fraction");
                    RefreshInput::Scrolled { fraction }
                }
                Cause::Released => RefreshInput::DragEnded,
                Cause::Begin => RefreshInput::Begin,
                Cause::End => RefreshInput::End,
            };

            let Some((previous, next)) = inner.machine.send(&input) else {
                return;
            };
            tracing::debug!(?previous, ?next, "Refresh state changed");

            let step = Step {
                previous,
                next,
                header,
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
            header,
            trigger,
            config,
        } = step;

        match next {
            RefreshState::Pulling(_) => {
                self.reveal(surface, &*header, &config);
            }
            RefreshState::Active => {
                let original = self.reveal(surface, &*header, &config);
                let outset = config.outset_height(header.size().height);
                self.animate_top(surface, original.top + outset, &config, false);
            }
            RefreshState::Idle => self.restore(surface, &*header, &config),
        }

        header.on_refresh_state_changed(previous, next);

        if next.is_active() {
            if let Some(trigger) = trigger {
                trigger();
            }
        }
    }

    /// Attach (or re-attach) the header and place it; returns the original insets
    fn reveal(
        &self,
        surface: &dyn ScrollSurface,
        header: &dyn RefreshHeader,
        config: &ControllerConfig,
    ) -> Insets {
        let view = header.view_id();
        let attached = surface.contains_child(view);
        let original = *lock(&self.inner)
            .original
            .get_or_insert_with(|| surface.insets());

        let frame = header_frame(
            surface.bounds().width(),
            header.size(),
            config.edge_insets,
            original.top,
        );
        if attached {
            surface.set_child_frame(view, frame);
        } else {
            tracing::debug!(?view, ?frame, "Attaching refresh header");
            surface.insert_child(view, frame);
        }

        original
    }

    fn restore(
        &self,
        surface: &dyn ScrollSurface,
        header: &dyn RefreshHeader,
        config: &ControllerConfig,
    ) {
        let original = lock(&self.inner).original;
        match original {
            Some(original) => self.animate_top(surface, original.top, config, true),
            None => surface.remove_child(header.view_id()),
        }
    }

    fn animate_top(
        &self,
        surface: &dyn ScrollSurface,
        value: f32,
        config: &ControllerConfig,
        detach_when_done: bool,
    ) {
        let generation = {
            let mut inner = lock(&self.inner);
            inner.generation += 1;
            inner.generation
        };

        let completion: AnimationCompletion = if detach_when_done {
            let this = self.this.clone();
            Box::new(move |finished| {
                if let Some(controller) = this.upgrade() {
                    controller.finish_restore(generation, finished);
                }
            })
        } else {
            Box::new(|_| {})
        };

        tracing::debug!(value, generation, "Animating top inset");
        surface.animate_inset(Edge::Top, value, config.animation_duration(), completion);
    }

    fn finish_restore(&self, generation: u64, finished: bool) {
        if !finished {
            tracing::trace!(generation, "Top inset restore superseded");
            return;
        }
        let Some(surface) = self.surface.upgrade() else {
            return;
        };

        let view = {
            let mut inner = lock(&self.inner);
            if inner.generation != generation || !inner.machine.is_in(&RefreshState::Idle) {
                return;
            }
            inner.original = None;
            inner.header.as_ref().map(|header| header.view_id())
        };

        if let Some(view) = view {
            tracing::debug!(?view, "Detaching refresh header");
            surface.remove_child(view);
        }
    }
}
