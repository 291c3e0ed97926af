//! Riffle Refresh
//!
//! Pull-to-refresh and load-more controllers for any scroll surface that
//! implements [`ScrollSurface`].
//!
//! # Features
//!
//! - **Refresh**: a header above the content that follows the pull and
//!   fires once released past its height
//! - **Load more**: a footer below the content that fires as the bottom
//!   edge approaches, with an exhausted state
//! - **Binding**: at most one controller of each kind per surface
//! - **Headless surface**: an in-memory [`ScrollSurface`] for tests and
//!   simulations
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use riffle_core::{DragPhase, Point, ScrollSurface, Size, ViewId};
//! use riffle_refresh::{HeadlessSurface, RefreshController, RefreshState, SystemRefreshControl};
//!
//! let surface = HeadlessSurface::new(Size::new(320.0, 480.0));
//! let dyn_surface: Arc<dyn ScrollSurface> = surface.clone();
//! let controller = RefreshController::attach(&dyn_surface);
//!
//! let header = SystemRefreshControl::new(ViewId(1), Size::new(320.0, 40.0), || {}, || {});
//! controller.setup(Arc::new(header), || println!("refreshing")).unwrap();
//!
//! surface.set_drag_phase(DragPhase::Began);
//! surface.scroll_to(Point::new(0.0, -45.0));
//! surface.set_drag_phase(DragPhase::Ended);
//! assert_eq!(controller.state(), RefreshState::Active);
//! ```

use std::sync::Arc;

pub mod binding;
pub mod config;
pub mod headless;
pub mod load_more;
pub mod refresh;
pub mod widget;

pub use binding::SurfaceBinding;
pub use config::ControllerConfig;
pub use headless::{HeadlessChild, HeadlessSurface};
pub use load_more::{LoadMoreController, LoadMoreState};
pub use refresh::{RefreshController, RefreshState};
pub use widget::{LoadMoreFooter, RefreshHeader, SystemRefreshControl};

pub use riffle_core::{Result, RiffleError, ScrollSurface};

/// Callback fired each time a controller enters its `Active` state
pub type Trigger = Arc<dyn Fn() + Send + Sync>;
