//! Feed Simulation
//!
//! Drives a refresh header and a load-more footer on a headless surface
//! the way a user would: pull to refresh, then scroll through three pages
//! until the feed runs out.
//!
//! Run with: RUST_LOG=riffle_refresh=debug cargo run -p riffle_refresh --example simulate

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use riffle_core::{DragPhase, Insets, Point, ScrollSurface, Size, ViewId};
use riffle_refresh::{
    HeadlessSurface, LoadMoreFooter, LoadMoreState, RefreshState, SurfaceBinding,
    SystemRefreshControl,
};
use tracing_subscriber::EnvFilter;

const ROW_HEIGHT: f32 = 80.0;
const PAGE_ROWS: usize = 20;
const PAGES: usize = 3;

struct Spinner;

impl LoadMoreFooter for Spinner {
    fn view_id(&self) -> ViewId {
        ViewId(2)
    }

    fn size(&self) -> Size {
        Size::new(375.0, 44.0)
    }

    fn preload(&self) -> f32 {
        0.25
    }

    fn on_load_more_state_changed(&self, previous: LoadMoreState, next: LoadMoreState) {
        tracing::info!(?previous, ?next, "Footer");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let surface = HeadlessSurface::new(Size::new(375.0, 667.0));
    surface.set_insets(Insets::new(64.0, 0.0, 34.0, 0.0));
    surface.scroll_to(Point::new(0.0, -64.0));
    let shared: Arc<dyn ScrollSurface> = surface.clone();

    let binding = SurfaceBinding::new();
    let refresh = binding.get_or_create_refresh_controller(&shared);
    let load_more = binding.get_or_create_load_more_controller(&shared);

    let control = SystemRefreshControl::new(
        ViewId(1),
        Size::new(375.0, 60.0),
        || tracing::info!("Spinner started"),
        || tracing::info!("Spinner stopped"),
    );
    refresh.setup(Arc::new(control), || tracing::info!("Reloading feed"))?;

    let loaded = Arc::new(AtomicUsize::new(1));
    let pages = Arc::clone(&loaded);
    load_more.setup(Arc::new(Spinner), move || {
        tracing::info!(page = pages.load(Ordering::SeqCst) + 1, "Fetching page");
    })?;
    surface.set_content_size(Size::new(375.0, ROW_HEIGHT * PAGE_ROWS as f32));

    // Pull to refresh
    surface.set_drag_phase(DragPhase::Began);
    for step in 1..=10 {
        surface.scroll_to(Point::new(0.0, -64.0 - 8.0 * step as f32));
    }
    surface.set_drag_phase(DragPhase::Ended);
    surface.settle();
    anyhow::ensure!(
        refresh.state() == RefreshState::Active,
        "pull did not trigger a refresh"
    );

    refresh.end_refreshing();
    surface.settle();
    surface.scroll_to(Point::new(0.0, -64.0));

    // Scroll through the feed
    let mut y = -64.0;
    while !load_more.is_exhausted() {
        y += 120.0;
        surface.scroll_to(Point::new(0.0, y));
        surface.advance(Duration::from_millis(16));

        if load_more.is_refreshing() {
            let page = loaded.fetch_add(1, Ordering::SeqCst) + 1;
            surface.set_content_size(Size::new(
                375.0,
                ROW_HEIGHT * (PAGE_ROWS * page) as f32,
            ));
            load_more.end_refreshing(page == PAGES);
            surface.settle();
        }
    }

    tracing::info!(
        pages = loaded.load(Ordering::SeqCst),
        insets = ?surface.insets(),
        "Feed exhausted"
    );
    Ok(())
}
