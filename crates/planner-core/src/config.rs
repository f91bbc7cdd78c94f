//! Fixed grid parameters shared by every query.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Errors from validating a [`GridConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("grid must be at least 1x1, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },
    #[error("reserved core region {core:?} must be non-empty and inside the grid")]
    CoreOutsideGrid { core: Rect },
    #[error("route expansion cap must be positive")]
    ZeroExpansionCap,
}

/// Grid size, reserved core region and tuning constants.
///
/// The core doubles as the power source: relays within `power_range` of it
/// are energized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub width: u32,
    pub height: u32,
    /// Reserved central region. Nothing may be placed over it.
    pub core: Rect,
    /// Maximum edge-to-edge Chebyshev gap, in cells, for two power nodes to link.
    pub power_range: u32,
    /// Cells of slack around the grid that belt search may wander into.
    pub route_margin: i32,
    /// Maximum node expansions before belt search gives up.
    pub route_max_expansions: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 48,
            height: 48,
            core: Rect::new(21, 21, 6, 6),
            power_range: 6,
            route_margin: 50,
            route_max_expansions: 10_000,
        }
    }
}

impl GridConfig {
    /// A grid of the given size with the default tuning and a core centered in it.
    pub fn with_size(width: u32, height: u32, core_side: u32) -> Self {
        let core_x = (width.saturating_sub(core_side) / 2) as i32;
        let core_y = (height.saturating_sub(core_side) / 2) as i32;
        Self {
            width,
            height,
            core: Rect::new(core_x, core_y, core_side, core_side),
            ..Self::default()
        }
    }

    /// The whole grid as a rectangle anchored at the origin.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        if self.core.width == 0 || self.core.height == 0 || !self.bounds().contains_rect(&self.core)
        {
            return Err(ConfigError::CoreOutsideGrid { core: self.core });
        }
        if self.route_max_expansions == 0 {
            return Err(ConfigError::ZeroExpansionCap);
        }
        Ok(())
    }
}
