//! Spatial queries over a layout snapshot: placement validation and belt
//! routing.
//!
//! Both halves are read-only. A caller re-runs them after every edit; no
//! result is cached between calls.

pub mod placement;
pub mod routing;

pub use placement::{
    bounding_box, check_placement, is_placement_valid, item_bounds, PlacementError,
};
pub use routing::{
    direct_path, occupied_cells, port_anchor, route_all, route_belt, route_connection, BeltRoute,
    PathPoint, PortAnchor, RouteKind, RouteRequest,
};
