//! Power coverage for a layout.
//!
//! The reserved core is the only power source. Relays extend its reach: a
//! relay is energized if it is within range of the core or of another
//! energized relay. Machines are powered when an energized relay is within
//! range of them.
//!
//! # Design
//!
//! - "In range" means the edge-to-edge Chebyshev gap between two footprints
//!   is at most [`GridConfig::power_range`].
//! - Propagation is a breadth-first search over the implicit relay graph.
//!   Relay and machine counts are bounded by the grid, so the quadratic
//!   adjacency test is fine.
//! - Results are recomputed from the snapshot on every call.

use std::collections::{BTreeSet, VecDeque};

use planner_core::catalog::Catalog;
use planner_core::config::GridConfig;
use planner_core::fixed::Fixed64;
use planner_core::geometry::Rect;
use planner_core::id::ItemId;
use planner_core::layout::Layout;
use planner_core::model::DeviceRole;
use planner_spatial::item_bounds;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Which relays carry power and which machines receive it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerCoverage {
    pub energized_relays: BTreeSet<ItemId>,
    pub powered: BTreeSet<ItemId>,
}

impl PowerCoverage {
    pub fn is_energized(&self, relay: ItemId) -> bool {
        self.energized_relays.contains(&relay)
    }

    pub fn is_powered(&self, item: ItemId) -> bool {
        self.powered.contains(&item)
    }
}

/// Coverage plus the power draw it implies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerReport {
    pub coverage: PowerCoverage,
    /// Summed draw of every powered machine.
    pub powered_draw: Fixed64,
    /// Summed draw of machines left without power.
    pub unpowered_draw: Fixed64,
    /// Machines that draw power but are out of reach, in id order.
    pub unpowered: Vec<ItemId>,
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// True when two footprints are within `range` cells of each other, edge to
/// edge. Touching or overlapping footprints are always in range.
pub fn in_range(a: &Rect, b: &Rect, range: u32) -> bool {
    a.chebyshev_gap(b) <= range
}

// ---------------------------------------------------------------------------
// Propagation
// ---------------------------------------------------------------------------

/// Compute which relays are energized and which machines are powered.
pub fn propagate_power(catalog: &Catalog, layout: &Layout, config: &GridConfig) -> PowerCoverage {
    let mut relays: Vec<(ItemId, Rect)> = Vec::new();
    let mut consumers: Vec<(ItemId, Rect)> = Vec::new();
    for (id, item) in layout.items() {
        let Some(blueprint) = catalog.blueprint(item.blueprint) else {
            continue;
        };
        let bounds = blueprint.footprint_at(item.position, item.rotation);
        if blueprint.role == DeviceRole::Relay {
            relays.push((id, bounds));
        } else {
            consumers.push((id, bounds));
        }
    }

    let range = config.power_range;
    let mut energized = vec![false; relays.len()];
    let mut queue = VecDeque::new();

    for (index, (_, bounds)) in relays.iter().enumerate() {
        if in_range(&config.core, bounds, range) {
            energized[index] = true;
            queue.push_back(index);
        }
    }

    while let Some(current) = queue.pop_front() {
        let from = relays[current].1;
        for (index, (_, bounds)) in relays.iter().enumerate() {
            if !energized[index] && in_range(&from, bounds, range) {
                energized[index] = true;
                queue.push_back(index);
            }
        }
    }

    let live: Vec<Rect> = relays
        .iter()
        .zip(&energized)
        .filter(|(_, on)| **on)
        .map(|((_, bounds), _)| *bounds)
        .collect();

    let coverage = PowerCoverage {
        energized_relays: relays
            .iter()
            .zip(&energized)
            .filter(|(_, on)| **on)
            .map(|((id, _), _)| *id)
            .collect(),
        powered: consumers
            .iter()
            .filter(|(_, bounds)| live.iter().any(|relay| in_range(relay, bounds, range)))
            .map(|(id, _)| *id)
            .collect(),
    };

    debug!(
        relays = relays.len(),
        energized = coverage.energized_relays.len(),
        machines = consumers.len(),
        powered = coverage.powered.len(),
        "power propagated"
    );
    coverage
}

/// Coverage plus powered/unpowered draw totals.
pub fn power_report(catalog: &Catalog, layout: &Layout, config: &GridConfig) -> PowerReport {
    let coverage = propagate_power(catalog, layout, config);
    let mut report = PowerReport::default();

    for (id, item) in layout.items() {
        let Some(blueprint) = catalog.blueprint(item.blueprint) else {
            continue;
        };
        if blueprint.role == DeviceRole::Relay {
            continue;
        }
        if coverage.is_powered(id) {
            report.powered_draw += blueprint.power_draw;
        } else if blueprint.power_draw > Fixed64::ZERO {
            report.unpowered_draw += blueprint.power_draw;
            report.unpowered.push(id);
        }
    }
    report.unpowered.sort();
    report.coverage = coverage;
    report
}

/// Footprint of an item for callers that only need range checks.
pub fn item_region(catalog: &Catalog, layout: &Layout, item: ItemId) -> Option<Rect> {
    item_bounds(catalog, layout.item(item)?)
}

// ===========================================================================
// Tests
// ===========================================================================
