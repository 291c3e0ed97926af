//! Animation scheduler
//!
//! Manages all active inset tweens for one surface and advances them each
//! frame. At most one tween runs per edge: a new request for an edge
//! replaces the running one (last-write-wins) instead of queueing behind it.

use riffle_core::{AnimationCompletion, Edge};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::tween::InsetTween;

new_key_type! {
    pub struct TweenId;
}

/// Values and completions produced by one scheduler step
///
/// Apply `values` to the surface first, then call [`FrameUpdate::complete`]
/// with no locks held.
#[derive(Default)]
pub struct FrameUpdate {
    /// New value for every edge with a running tween
    pub values: SmallVec<[(Edge, f32); 4]>,
    /// Completions of tweens that reached their target this step
    pub finished: Vec<AnimationCompletion>,
}

impl FrameUpdate {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.finished.is_empty()
    }

    /// Run the finished completions with `true`
    pub fn complete(self) {
        for completion in self.finished {
            completion(true);
        }
    }
}

/// The animation scheduler that ticks all active tweens
pub struct AnimationScheduler {
    tweens: SlotMap<TweenId, InsetTween>,
    by_edge: FxHashMap<Edge, TweenId>,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self {
            tweens: SlotMap::with_key(),
            by_edge: FxHashMap::default(),
        }
    }

    /// Start a tween, replacing any tween already running on its edge
    ///
    /// Returns the new tween's id and the replaced tween's completion, which
    /// the caller must run with `false` once no locks are held.
    pub fn animate(&mut self, tween: InsetTween) -> (TweenId, Option<AnimationCompletion>) {
        let edge = tween.edge();
        let superseded = self.cancel(edge);
        let id = self.tweens.insert(tween);
        self.by_edge.insert(edge, id);

        tracing::trace!(?edge, replaced = superseded.is_some(), "Inset tween started");
        (id, superseded)
    }

    /// Stop the tween on `edge` where it is, returning its completion
    pub fn cancel(&mut self, edge: Edge) -> Option<AnimationCompletion> {
        let id = self.by_edge.remove(&edge)?;
        self.tweens
            .remove(id)
            .and_then(|mut tween| tween.take_completion())
    }

    pub fn get(&self, id: TweenId) -> Option<&InsetTween> {
        self.tweens.get(id)
    }

    /// Target value of the tween running on `edge`
    pub fn target(&self, edge: Edge) -> Option<f32> {
        self.by_edge
            .get(&edge)
            .and_then(|id| self.tweens.get(*id))
            .map(InsetTween::target)
    }

    /// Tick all tweens by an explicit delta (in milliseconds)
    pub fn step(&mut self, dt_ms: f32) -> FrameUpdate {
        let mut update = FrameUpdate::default();
        let mut done: SmallVec<[TweenId; 4]> = SmallVec::new();

        for (id, tween) in self.tweens.iter_mut() {
            update.values.push((tween.edge(), tween.tick(dt_ms)));
            if tween.is_finished() {
                done.push(id);
            }
        }

        for id in done {
            if let Some(mut tween) = self.tweens.remove(id) {
                self.by_edge.remove(&tween.edge());
                if let Some(completion) = tween.take_completion() {
                    update.finished.push(completion);
                }
            }
        }

        update
    }

    /// Check if any tweens are still running
    pub fn has_active_animations(&self) -> bool {
        !self.tweens.is_empty()
    }

    /// Get the number of running tweens
    pub fn tween_count(&self) -> usize {
        self.tweens.len()
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Easing;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn recorder() -> (Arc<Mutex<Vec<bool>>>, AnimationCompletion) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        (log, Box::new(move |finished| sink.lock().unwrap().push(finished)))
    }

    #[test]
    fn test_step_reaches_target_and_completes() {
        let mut scheduler = AnimationScheduler::new();
        let (log, completion) = recorder();
        scheduler.animate(
            InsetTween::new(Edge::Top, 40.0, 0.0, Duration::from_millis(250), Easing::Linear)
                .with_completion(completion),
        );

        let update = scheduler.step(100.0);
        assert_eq!(update.values.as_slice(), &[(Edge::Top, 24.0)]);
        assert!(update.finished.is_empty());

        let update = scheduler.step(200.0);
        assert_eq!(update.values.as_slice(), &[(Edge::Top, 0.0)]);
        update.complete();

        assert_eq!(*log.lock().unwrap(), vec![true]);
        assert!(!scheduler.has_active_animations());
    }

    #[test]
    fn test_same_edge_is_last_write_wins() {
        let mut scheduler = AnimationScheduler::new();
        let (first_log, first) = recorder();
        let (second_log, second) = recorder();

        scheduler.animate(
            InsetTween::new(Edge::Top, 40.0, 0.0, Duration::from_millis(250), Easing::Linear)
                .with_completion(first),
        );
        let (_, superseded) = scheduler.animate(
            InsetTween::new(Edge::Top, 20.0, 40.0, Duration::from_millis(250), Easing::Linear)
                .with_completion(second),
        );

        superseded.expect("first completion returned")(false);
        assert_eq!(scheduler.tween_count(), 1);
        assert_eq!(scheduler.target(Edge::Top), Some(40.0));

        scheduler.step(250.0).complete();
        assert_eq!(*first_log.lock().unwrap(), vec![false]);
        assert_eq!(*second_log.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_edges_animate_independently() {
        let mut scheduler = AnimationScheduler::new();
        scheduler.animate(InsetTween::new(
            Edge::Top,
            0.0,
            40.0,
            Duration::from_millis(100),
            Easing::Linear,
        ));
        scheduler.animate(InsetTween::new(
            Edge::Bottom,
            0.0,
            50.0,
            Duration::from_millis(200),
            Easing::Linear,
        ));

        let update = scheduler.step(100.0);
        assert_eq!(update.values.len(), 2);
        assert_eq!(scheduler.target(Edge::Top), None);
        assert_eq!(scheduler.target(Edge::Bottom), Some(50.0));
    }

    #[test]
    fn test_cancel_returns_completion() {
        let mut scheduler = AnimationScheduler::new();
        let (log, completion) = recorder();
        scheduler.animate(
            InsetTween::new(Edge::Bottom, 0.0, 50.0, Duration::from_millis(100), Easing::Linear)
                .with_completion(completion),
        );

        scheduler.cancel(Edge::Bottom).expect("completion")(false);
        assert!(scheduler.cancel(Edge::Bottom).is_none());
        assert_eq!(*log.lock().unwrap(), vec![false]);
    }
}
