//! Controller configuration
//!
//! Supplied once at setup and immutable afterward. Widgets provide the
//! defaults; callers can override them, including from a TOML document:
//!
//! ```toml
//! preload_fraction = 0.5
//! keep_space_when_exhausted = false
//! animation_duration_ms = 300
//!
//! [edge_insets]
//! top = 8.0
//! bottom = 8.0
//! ```

use std::time::Duration;

use riffle_core::{Insets, Result, RiffleError};
use serde::{Deserialize, Serialize};

use crate::widget::{LoadMoreFooter, RefreshHeader};

/// Duration of inset reveal and restore animations
pub const DEFAULT_ANIMATION_MS: u64 = 250;

/// Configuration for a refresh or load-more controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Fraction of a viewport height before the bottom at which loading
    /// starts (load-more only)
    pub preload_fraction: f32,
    /// Keep the footer and its inset once exhausted (load-more only)
    pub keep_space_when_exhausted: bool,
    /// Margin reserved around the widget
    pub edge_insets: Insets,
    /// Duration of inset animations in milliseconds
    pub animation_duration_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            preload_fraction: 0.0,
            keep_space_when_exhausted: true,
            edge_insets: Insets::ZERO,
            animation_duration_ms: DEFAULT_ANIMATION_MS,
        }
    }
}

impl ControllerConfig {
    /// Defaults taken from a header's capabilities
    pub fn for_header(header: &dyn RefreshHeader) -> Self {
        Self {
            edge_insets: header.edge_insets(),
            ..Default::default()
        }
    }

    /// Defaults taken from a footer's capabilities
    pub fn for_footer(footer: &dyn LoadMoreFooter) -> Self {
        Self {
            preload_fraction: footer.preload(),
            keep_space_when_exhausted: footer.is_visible_when_exhausted(),
            edge_insets: footer.edge_insets(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RiffleError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no controller can honor
    pub fn validate(&self) -> Result<()> {
        if !self.preload_fraction.is_finite() || self.preload_fraction < 0.0 {
            return Err(RiffleError::InvalidConfig(format!(
                "preload_fraction must be a non-negative number, got {}",
                self.preload_fraction
            )));
        }
        if !self.edge_insets.is_valid() {
            return Err(RiffleError::InvalidConfig(format!(
                "edge_insets must be non-negative numbers, got {:?}",
                self.edge_insets
            )));
        }
        Ok(())
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    /// Widget height plus the vertical edge insets
    pub fn outset_height(&self, widget_height: f32) -> f32 {
        widget_height + self.edge_insets.vertical()
    }
}
