//! Riffle Animation System
//!
//! Eased inset tweens and the scheduler that advances them.
//!
//! # Features
//!
//! - **Easing**: linear and ease-out cubic curves with exact endpoints
//! - **Inset tweens**: one edge, one target, fixed duration
//! - **Last-write-wins**: a new request for an edge replaces the running one

pub mod easing;
pub mod scheduler;
pub mod tween;

pub use easing::Easing;
pub use scheduler::{AnimationScheduler, FrameUpdate, TweenId};
pub use tween::InsetTween;
