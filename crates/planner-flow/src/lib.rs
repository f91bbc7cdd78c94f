//! Throughput propagation over the belt graph.
//!
//! Every connection carries the rate emitted by its source port. Production
//! machines emit their recipe output spread over their output ports,
//! splitters divide what they receive across their outgoing belts, and
//! mergers pass on the sum of their inputs.
//!
//! # Cycles
//!
//! Splitters and mergers can be wired into loops. The walk carries the set of
//! ports already on the current path; revisiting one contributes zero. Each
//! branch gets its own copy of that set, so two inputs feeding the same
//! merger never suppress each other.

use std::collections::{BTreeMap, BTreeSet};

use planner_core::catalog::Catalog;
use planner_core::fixed::{Fixed64, per_minute};
use planner_core::id::{ConnectionId, ItemId, PortRef};
use planner_core::layout::Layout;
use planner_core::model::DeviceRole;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Rate walk
// ---------------------------------------------------------------------------

struct RateWalk<'a> {
    catalog: &'a Catalog,
    layout: &'a Layout,
}

impl<'a> RateWalk<'a> {
    fn new(catalog: &'a Catalog, layout: &'a Layout) -> Self {
        Self { catalog, layout }
    }

    /// Items per second leaving `port`.
    fn rate(&self, port: PortRef, visited: &BTreeSet<PortRef>) -> Fixed64 {
        if visited.contains(&port) {
            trace!(item = ?port.item, port = port.port, "cycle cut");
            return Fixed64::ZERO;
        }
        let Some(blueprint) = self.layout.blueprint_of(self.catalog, port.item) else {
            return Fixed64::ZERO;
        };
        match blueprint.port(port.port) {
            Some(p) if p.is_output() => {}
            _ => return Fixed64::ZERO,
        }

        let mut branch = visited.clone();
        branch.insert(port);

        match blueprint.role {
            DeviceRole::Splitter => {
                let outgoing = self.layout.connections_from(port.item).count();
                if outgoing == 0 {
                    return Fixed64::ZERO;
                }
                let incoming = self.incoming(port.item, &branch);
                incoming
                    .checked_div_int(outgoing as i64)
                    .unwrap_or(Fixed64::ZERO)
            }
            DeviceRole::Merger => self.incoming(port.item, &branch),
            DeviceRole::Production | DeviceRole::Relay => self.production(port.item),
        }
    }

    /// Sum of the rates of every belt arriving at `item`.
    fn incoming(&self, item: ItemId, visited: &BTreeSet<PortRef>) -> Fixed64 {
        self.layout
            .connections_into(item)
            .map(|(_, c)| self.rate(c.source, visited))
            .fold(Fixed64::ZERO, |acc, r| acc.saturating_add(r))
    }

    /// Per-port rate of a machine running its recipe. Zero without a recipe,
    /// with inputs left unconnected, or with no output ports.
    fn production(&self, item: ItemId) -> Fixed64 {
        let Some(placed) = self.layout.item(item) else {
            return Fixed64::ZERO;
        };
        let Some(recipe) = placed.recipe.and_then(|id| self.catalog.recipe(id)) else {
            return Fixed64::ZERO;
        };
        if self.layout.connected_input_count(item) < recipe.inputs.len() {
            return Fixed64::ZERO;
        }
        let Some(blueprint) = self.catalog.blueprint(placed.blueprint) else {
            return Fixed64::ZERO;
        };
        let outputs = blueprint.output_port_count();
        if outputs == 0 {
            return Fixed64::ZERO;
        }
        recipe
            .output_per_second()
            .checked_div_int(outputs as i64)
            .unwrap_or(Fixed64::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Items per minute flowing along every connection.
pub fn compute_throughput(catalog: &Catalog, layout: &Layout) -> BTreeMap<ConnectionId, Fixed64> {
    let walk = RateWalk::new(catalog, layout);
    let rates: BTreeMap<_, _> = layout
        .connections()
        .map(|(id, c)| (id, per_minute(walk.rate(c.source, &BTreeSet::new()))))
        .collect();
    debug!(connections = rates.len(), "throughput computed");
    rates
}

/// Items per minute leaving a single port.
pub fn port_rate(catalog: &Catalog, layout: &Layout, port: PortRef) -> Fixed64 {
    per_minute(RateWalk::new(catalog, layout).rate(port, &BTreeSet::new()))
}

/// Total items per minute a machine emits.
///
/// Production machines and mergers count every output port. Splitters count
/// only ports with a belt attached, since their input is divided across
/// belts rather than ports.
pub fn item_output_rate(catalog: &Catalog, layout: &Layout, item: ItemId) -> Fixed64 {
    let Some(blueprint) = layout.blueprint_of(catalog, item) else {
        return Fixed64::ZERO;
    };
    let walk = RateWalk::new(catalog, layout);
    let ports: Vec<usize> = match blueprint.role {
        DeviceRole::Splitter => layout
            .connections_from(item)
            .map(|(_, c)| c.source.port)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        _ => (0..blueprint.ports.len())
            .filter(|&i| blueprint.port(i).is_some_and(|p| p.is_output()))
            .collect(),
    };
    let per_second = ports
        .into_iter()
        .map(|port| walk.rate(PortRef::new(item, port), &BTreeSet::new()))
        .fold(Fixed64::ZERO, |acc, r| acc.saturating_add(r));
    per_minute(per_second)
}

// ===========================================================================
// Tests
// ===========================================================================
