//! Belt routing between two oriented ports.
//!
//! Most belts run through open space, so the router first tries nothing
//! clever: an L-shaped Manhattan path from the cell in front of the source
//! port to the cell in front of the target port. When an obstacle set is
//! supplied it runs a bounded A* search instead, and falls back to the
//! L-path if the search fails.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet};

use planner_core::catalog::Catalog;
use planner_core::config::GridConfig;
use planner_core::fixed::Fixed64;
use planner_core::geometry::{Direction, GridPosition};
use planner_core::id::{ConnectionId, PortRef};
use planner_core::layout::Layout;
use planner_core::model::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::placement::item_bounds;

/// Half a cell, in cell units.
const HALF_CELL: Fixed64 = Fixed64::from_bits(1 << 31);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A point on a rendered belt, in cell units. Cell `(x, y)` spans
/// `[x, x+1) x [y, y+1)`, so its centre is `(x + 0.5, y + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: Fixed64,
    pub y: Fixed64,
}

impl PathPoint {
    /// Centre of a cell.
    pub fn center(cell: GridPosition) -> Self {
        Self {
            x: Fixed64::from_num(cell.x).saturating_add(HALF_CELL),
            y: Fixed64::from_num(cell.y).saturating_add(HALF_CELL),
        }
    }

    /// Midpoint of the cell edge that `facing` points at.
    pub fn edge(cell: GridPosition, facing: Direction) -> Self {
        let center = Self::center(cell);
        let (dx, dy) = facing.offset();
        Self {
            x: center.x.saturating_add(HALF_CELL * Fixed64::from_num(dx)),
            y: center.y.saturating_add(HALF_CELL * Fixed64::from_num(dy)),
        }
    }
}

/// How a route was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// L-path; no obstacle set was given, or the ports face the same cell.
    Direct,
    /// Obstacle-avoiding search succeeded.
    Searched,
    /// Search failed or hit its cap; the L-path may cross obstacles.
    Fallback,
}

/// A routed belt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeltRoute {
    /// Cells the belt occupies, from the source side to the target side.
    pub cells: Vec<GridPosition>,
    /// Polyline for drawing: source edge, cell centres, target edge.
    pub points: Vec<PathPoint>,
    pub kind: RouteKind,
}

impl BeltRoute {
    /// True when the route may pass through obstacles.
    pub fn is_fallback(&self) -> bool {
        self.kind == RouteKind::Fallback
    }
}

/// Endpoints and obstacles for one belt.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub start: GridPosition,
    pub start_facing: Direction,
    pub end: GridPosition,
    pub end_facing: Direction,
    /// Cells the belt must avoid. `None` skips the search entirely.
    pub obstacles: Option<&'a BTreeSet<GridPosition>>,
    /// Cells that never block, even if listed in `obstacles`.
    pub ignore: &'a BTreeSet<GridPosition>,
}

/// A port's world cell and facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAnchor {
    pub cell: GridPosition,
    pub facing: Direction,
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Route one belt.
pub fn route_belt(request: &RouteRequest<'_>, config: &GridConfig) -> BeltRoute {
    let exit = request.start.step(request.start_facing);
    let entry = request.end.step(request.end_facing);

    let (cells, kind) = match request.obstacles {
        Some(obstacles) if exit != entry => {
            let window = SearchWindow::around(config);
            match astar(exit, entry, obstacles, request.ignore, window, config.route_max_expansions) {
                SearchOutcome::Found(path) => (path, RouteKind::Searched),
                SearchOutcome::Exhausted => {
                    debug!(?exit, ?entry, cap = config.route_max_expansions, "belt search hit expansion cap, using direct path");
                    (direct_path(request.start, exit, entry, request.end), RouteKind::Fallback)
                }
                SearchOutcome::Unreachable => {
                    debug!(?exit, ?entry, "no obstacle-free belt route, using direct path");
                    (direct_path(request.start, exit, entry, request.end), RouteKind::Fallback)
                }
            }
        }
        _ => (direct_path(request.start, exit, entry, request.end), RouteKind::Direct),
    };

    let mut points = Vec::with_capacity(cells.len() + 2);
    points.push(PathPoint::edge(request.start, request.start_facing));
    points.extend(cells.iter().copied().map(PathPoint::center));
    points.push(PathPoint::edge(request.end, request.end_facing));
    points.dedup();

    BeltRoute {
        cells,
        points,
        kind,
    }
}

/// L-shaped path from `exit` to `entry`: along x first, then along y.
///
/// Cells equal to either port cell are skipped so the machine's own cell is
/// never counted as belt.
pub fn direct_path(
    start: GridPosition,
    exit: GridPosition,
    entry: GridPosition,
    end: GridPosition,
) -> Vec<GridPosition> {
    let mut path = Vec::with_capacity(exit.manhattan_distance(&entry) as usize + 1);
    let mut push = |cell: GridPosition| {
        if cell != start && cell != end {
            path.push(cell);
        }
    };

    let mut cur = exit;
    push(cur);
    while cur.x != entry.x {
        cur.x += entry.x.cmp(&cur.x) as i32;
        push(cur);
    }
    while cur.y != entry.y {
        cur.y += entry.y.cmp(&cur.y) as i32;
        push(cur);
    }
    path
}

// ---------------------------------------------------------------------------
// A* search
// ---------------------------------------------------------------------------

/// Inclusive-exclusive coordinate bounds for the search.
#[derive(Debug, Clone, Copy)]
struct SearchWindow {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl SearchWindow {
    fn around(config: &GridConfig) -> Self {
        let margin = config.route_margin.max(0);
        Self {
            min_x: -margin,
            min_y: -margin,
            max_x: i32::try_from(config.width).unwrap_or(i32::MAX).saturating_add(margin),
            max_y: i32::try_from(config.height).unwrap_or(i32::MAX).saturating_add(margin),
        }
    }

    fn contains(&self, pos: GridPosition) -> bool {
        pos.x >= self.min_x && pos.x < self.max_x && pos.y >= self.min_y && pos.y < self.max_y
    }
}

enum SearchOutcome {
    Found(Vec<GridPosition>),
    Exhausted,
    Unreachable,
}

fn astar(
    from: GridPosition,
    to: GridPosition,
    obstacles: &BTreeSet<GridPosition>,
    ignore: &BTreeSet<GridPosition>,
    window: SearchWindow,
    max_expansions: usize,
) -> SearchOutcome {
    let blocked = |pos: &GridPosition| obstacles.contains(pos) && !ignore.contains(pos);

    // Heap entries: (f, h, position). Ties prefer the node closer to the goal.
    let mut open: BinaryHeap<Reverse<(u32, u32, GridPosition)>> = BinaryHeap::new();
    let mut best_cost: HashMap<GridPosition, u32> = HashMap::new();
    let mut came_from: HashMap<GridPosition, GridPosition> = HashMap::new();
    let mut closed: HashSet<GridPosition> = HashSet::new();

    let h0 = from.manhattan_distance(&to);
    open.push(Reverse((h0, h0, from)));
    best_cost.insert(from, 0);

    let mut expansions = 0usize;
    while let Some(Reverse((_, _, current))) = open.pop() {
        if !closed.insert(current) {
            continue;
        }
        expansions += 1;
        if expansions > max_expansions {
            return SearchOutcome::Exhausted;
        }
        if current == to {
            trace!(expansions, "belt search reached target");
            return SearchOutcome::Found(reconstruct(&came_from, current));
        }

        let g = best_cost.get(&current).copied().unwrap_or(0);
        for dir in Direction::all() {
            let next = current.step(dir);
            if !window.contains(next) || blocked(&next) || closed.contains(&next) {
                continue;
            }
            let tentative = g + 1;
            if best_cost.get(&next).is_some_and(|&known| known <= tentative) {
                continue;
            }
            best_cost.insert(next, tentative);
            came_from.insert(next, current);
            let h = next.manhattan_distance(&to);
            open.push(Reverse((tentative + h, h, next)));
        }
    }

    SearchOutcome::Unreachable
}

fn reconstruct(
    came_from: &HashMap<GridPosition, GridPosition>,
    mut current: GridPosition,
) -> Vec<GridPosition> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

// ---------------------------------------------------------------------------
// Layout helpers
// ---------------------------------------------------------------------------

/// Every cell covered by a placed item, plus the reserved core.
pub fn occupied_cells(catalog: &Catalog, layout: &Layout, config: &GridConfig) -> BTreeSet<GridPosition> {
    let mut cells: BTreeSet<GridPosition> = config.core.cells().collect();
    for (_, item) in layout.items() {
        if let Some(bounds) = item_bounds(catalog, item) {
            cells.extend(bounds.cells());
        }
    }
    cells
}

/// World cell and facing of a port, taking the item's rotation into account.
pub fn port_anchor(catalog: &Catalog, layout: &Layout, port: PortRef) -> Option<PortAnchor> {
    let item = layout.item(port.item)?;
    let blueprint = catalog.blueprint(item.blueprint)?;
    let (offset, facing) = blueprint.rotated_port(port.port, item.rotation)?;
    Some(PortAnchor {
        cell: item.position.offset_by(offset),
        facing,
    })
}

/// Route a connection, avoiding every occupied cell except the footprints of
/// its two endpoint machines. `None` if either port cannot be resolved.
pub fn route_connection(
    catalog: &Catalog,
    layout: &Layout,
    config: &GridConfig,
    connection: &Connection,
) -> Option<BeltRoute> {
    let occupied = occupied_cells(catalog, layout, config);
    route_with_obstacles(catalog, layout, config, connection, &occupied)
}

/// Route every connection in the layout. Connections whose ports cannot be
/// resolved are left out.
pub fn route_all(
    catalog: &Catalog,
    layout: &Layout,
    config: &GridConfig,
) -> BTreeMap<ConnectionId, BeltRoute> {
    let occupied = occupied_cells(catalog, layout, config);
    layout
        .connections()
        .filter_map(|(id, connection)| {
            route_with_obstacles(catalog, layout, config, connection, &occupied)
                .map(|route| (id, route))
        })
        .collect()
}

fn route_with_obstacles(
    catalog: &Catalog,
    layout: &Layout,
    config: &GridConfig,
    connection: &Connection,
    occupied: &BTreeSet<GridPosition>,
) -> Option<BeltRoute> {
    let source = port_anchor(catalog, layout, connection.source)?;
    let target = port_anchor(catalog, layout, connection.target)?;

    let mut ignore = BTreeSet::new();
    for item_id in [connection.source.item, connection.target.item] {
        if let Some(bounds) = layout.item(item_id).and_then(|item| item_bounds(catalog, item)) {
            ignore.extend(bounds.cells());
        }
    }

    let request = RouteRequest {
        start: source.cell,
        start_facing: source.facing,
        end: target.cell,
        end_facing: target.facing,
        obstacles: Some(occupied),
        ignore: &ignore,
    };
    Some(route_belt(&request, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use planner_core::geometry::Rotation;
    use planner_core::test_utils::*;

    fn p(x: i32, y: i32) -> GridPosition {
        GridPosition::new(x, y)
    }

    fn request<'a>(
        start: GridPosition,
        start_facing: Direction,
        end: GridPosition,
        end_facing: Direction,
        obstacles: Option<&'a BTreeSet<GridPosition>>,
        ignore: &'a BTreeSet<GridPosition>,
    ) -> RouteRequest<'a> {
        RouteRequest {
            start,
            start_facing,
            end,
            end_facing,
            obstacles,
            ignore,
        }
    }

    // -----------------------------------------------------------------------
    // Direct path
    // -----------------------------------------------------------------------

    #[test]
    fn direct_path_goes_x_then_y() {
        let path = direct_path(p(0, 0), p(1, 0), p(3, 2), p(3, 3));
        assert_eq!(path, vec![p(1, 0), p(2, 0), p(3, 0), p(3, 1), p(3, 2)]);
    }

    #[test]
    fn direct_path_skips_port_cells() {
        // Exit loops back through the start cell.
        let path = direct_path(p(2, 0), p(1, 0), p(3, 0), p(4, 0));
        assert_eq!(path, vec![p(1, 0), p(3, 0)]);
    }

    #[test]
    fn no_obstacles_uses_direct_route() {
        let ignore = BTreeSet::new();
        let req = request(p(0, 0), Direction::East, p(4, 0), Direction::West, None, &ignore);
        let route = route_belt(&req, &small_config());
        assert_eq!(route.kind, RouteKind::Direct);
        assert_eq!(route.cells, vec![p(1, 0), p(2, 0), p(3, 0)]);
    }

    #[test]
    fn coincident_exit_and_entry_is_direct() {
        let obstacles: BTreeSet<_> = [p(1, 0)].into_iter().collect();
        let ignore = BTreeSet::new();
        let req = request(p(0, 0), Direction::East, p(2, 0), Direction::West, Some(&obstacles), &ignore);
        let route = route_belt(&req, &small_config());
        assert_eq!(route.kind, RouteKind::Direct);
        assert_eq!(route.cells, vec![p(1, 0)]);
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    #[test]
    fn detours_around_obstacle() {
        let obstacles: BTreeSet<_> = [p(2, 0)].into_iter().collect();
        let ignore = BTreeSet::new();
        let req = request(p(0, 0), Direction::East, p(4, 0), Direction::West, Some(&obstacles), &ignore);
        let route = route_belt(&req, &small_config());

        assert_eq!(route.kind, RouteKind::Searched);
        assert!(!route.cells.contains(&p(2, 0)));
        assert!(route.cells.contains(&p(1, 0)));
        assert!(route.cells.contains(&p(3, 0)));
        assert_eq!(route.cells.first(), Some(&p(1, 0)));
        assert_eq!(route.cells.last(), Some(&p(3, 0)));
        // Shortest detour: 1 step up/down, 2 across, 1 back.
        assert_eq!(route.cells.len(), 5);
    }

    #[test]
    fn search_path_is_contiguous() {
        let obstacles: BTreeSet<_> = (0..6).map(|y| p(5, y)).collect();
        let ignore = BTreeSet::new();
        let req = request(p(2, 2), Direction::East, p(8, 2), Direction::West, Some(&obstacles), &ignore);
        let route = route_belt(&req, &small_config());
        assert_eq!(route.kind, RouteKind::Searched);
        for pair in route.cells.windows(2) {
            assert_eq!(pair[0].manhattan_distance(&pair[1]), 1);
        }
        assert!(route.cells.iter().all(|c| !obstacles.contains(c)));
    }

    #[test]
    fn ignored_cells_do_not_block() {
        let obstacles: BTreeSet<_> = [p(2, 0)].into_iter().collect();
        let ignore = obstacles.clone();
        let req = request(p(0, 0), Direction::East, p(4, 0), Direction::West, Some(&obstacles), &ignore);
        let route = route_belt(&req, &small_config());
        assert_eq!(route.kind, RouteKind::Searched);
        assert_eq!(route.cells, vec![p(1, 0), p(2, 0), p(3, 0)]);
    }

    #[test]
    fn enclosed_target_falls_back() {
        // Wall off the cell north of (3, 3) on every side.
        let obstacles: BTreeSet<_> = [p(3, 2), p(2, 3), p(4, 3), p(3, 4)].into_iter().collect();
        let ignore = BTreeSet::new();
        let mut config = small_config();
        config.route_margin = 2;
        let req = request(p(0, 0), Direction::East, p(3, 3), Direction::North, Some(&obstacles), &ignore);
        // The entry cell (3, 2) is itself an obstacle.
        let route = route_belt(&req, &config);
        assert_eq!(route.kind, RouteKind::Fallback);
        assert!(route.is_fallback());
        assert_eq!(route.cells.first(), Some(&p(1, 0)));
        assert_eq!(route.cells.last(), Some(&p(3, 2)));
    }

    #[test]
    fn expansion_cap_falls_back() {
        let obstacles: BTreeSet<_> = (-5..15).map(|y| p(10, y)).collect();
        let ignore = BTreeSet::new();
        let mut config = small_config();
        config.route_max_expansions = 3;
        let req = request(p(0, 5), Direction::East, p(19, 5), Direction::West, Some(&obstacles), &ignore);
        let route = route_belt(&req, &config);
        assert_eq!(route.kind, RouteKind::Fallback);
        assert_eq!(route.cells, direct_path(p(0, 5), p(1, 5), p(18, 5), p(19, 5)));
    }

    // -----------------------------------------------------------------------
    // Points
    // -----------------------------------------------------------------------

    #[test]
    fn points_start_and_end_on_machine_edges() {
        let ignore = BTreeSet::new();
        let req = request(p(0, 0), Direction::East, p(4, 0), Direction::West, None, &ignore);
        let route = route_belt(&req, &small_config());

        let first = route.points.first().unwrap();
        let last = route.points.last().unwrap();
        assert_eq!((first.x, first.y), (fixed(1.0), fixed(0.5)));
        assert_eq!((last.x, last.y), (fixed(4.0), fixed(0.5)));
        // Edge + 3 centres + edge.
        assert_eq!(route.points.len(), 5);
        assert_eq!(route.points[1], PathPoint::center(p(1, 0)));
    }

    #[test]
    fn points_have_no_consecutive_duplicates() {
        let ignore = BTreeSet::new();
        let req = request(p(0, 0), Direction::East, p(1, 3), Direction::North, None, &ignore);
        let route = route_belt(&req, &small_config());
        for pair in route.points.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    // -----------------------------------------------------------------------
    // Layout helpers
    // -----------------------------------------------------------------------

    #[test]
    fn port_anchor_applies_rotation() {
        let catalog = sample_catalog();
        let mut layout = Layout::new();
        // Assembler output (2, 1) east; rotated 90 -> (0, 2) south.
        let a = place_rotated(&mut layout, assembler(), 5, 5, Rotation::Cw90);
        let anchor = port_anchor(&catalog, &layout, PortRef::new(a, 2)).unwrap();
        assert_eq!(anchor.cell, p(5, 7));
        assert_eq!(anchor.facing, Direction::South);
        assert!(port_anchor(&catalog, &layout, PortRef::new(a, 9)).is_none());
    }

    #[test]
    fn occupied_cells_include_core_and_items() {
        let catalog = sample_catalog();
        let config = small_config();
        let mut layout = Layout::new();
        place(&mut layout, miner(), 0, 0);
        let cells = occupied_cells(&catalog, &layout, &config);
        assert_eq!(cells.len(), 16 + 4);
        assert!(cells.contains(&p(1, 1)));
        assert!(cells.contains(&p(8, 8)));
        assert!(!cells.contains(&p(2, 0)));
    }

    #[test]
    fn route_connection_avoids_other_machines() {
        let catalog = sample_catalog();
        let config = small_config();
        let mut layout = Layout::new();
        // Miner output at (1, 0) facing east -> cell (1, 0) on a miner at (0, 0).
        let m = place(&mut layout, miner(), 0, 0);
        // Assembler input 0 at (0, 0) facing west, placed at (6, 0).
        let a = place(&mut layout, assembler(), 6, 0);
        // A relay right in the straight line.
        place(&mut layout, relay(), 4, 0);
        let c = connect(&mut layout, m, 0, a, 0);

        let connection = *layout.connection(c).unwrap();
        let route = route_connection(&catalog, &layout, &config, &connection).unwrap();
        assert_eq!(route.kind, RouteKind::Searched);
        assert!(!route.cells.contains(&p(4, 0)));
        assert_eq!(route.cells.first(), Some(&p(2, 0)));
        assert_eq!(route.cells.last(), Some(&p(5, 0)));
    }

    #[test]
    fn route_all_skips_broken_connections() {
        let catalog = sample_catalog();
        let config = small_config();
        let mut layout = Layout::new();
        let m = place(&mut layout, miner(), 0, 0);
        let a = place(&mut layout, assembler(), 6, 0);
        let good = connect(&mut layout, m, 0, a, 0);
        let bad = connect(&mut layout, m, 5, a, 1);

        let routes = route_all(&catalog, &layout, &config);
        assert!(routes.contains_key(&good));
        assert!(!routes.contains_key(&bad));
    }
}
