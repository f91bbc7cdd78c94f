//! Placement and collision validation.

use planner_core::catalog::Catalog;
use planner_core::config::GridConfig;
use planner_core::geometry::{GridPosition, Rect, Rotation};
use planner_core::id::{BlueprintId, ItemId};
use planner_core::layout::Layout;
use planner_core::model::PlacedItem;

/// Why a candidate placement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("unknown blueprint {0:?}")]
    UnknownBlueprint(BlueprintId),
    #[error("footprint {bounds:?} extends outside the grid")]
    OutOfBounds { bounds: Rect },
    #[error("footprint {bounds:?} overlaps the reserved core")]
    ReservedRegion { bounds: Rect },
    #[error("footprint {bounds:?} collides with item {item:?}")]
    Collides { bounds: Rect, item: ItemId },
}

/// The rectangle a blueprint covers at `position` with `rotation`, or `None`
/// if the blueprint is unknown.
pub fn bounding_box(
    catalog: &Catalog,
    blueprint: BlueprintId,
    position: GridPosition,
    rotation: Rotation,
) -> Option<Rect> {
    catalog
        .blueprint(blueprint)
        .map(|bp| bp.footprint_at(position, rotation))
}

/// The rectangle a placed item currently covers.
pub fn item_bounds(catalog: &Catalog, item: &PlacedItem) -> Option<Rect> {
    bounding_box(catalog, item.blueprint, item.position, item.rotation)
}

/// Check a candidate placement, reporting the first rule it breaks.
///
/// Rules, in order: the blueprint must exist, the footprint must lie inside
/// the grid, must not overlap the reserved core, and must not overlap any
/// other placed item. `exclude` skips one item (the one being moved).
pub fn check_placement(
    catalog: &Catalog,
    layout: &Layout,
    config: &GridConfig,
    blueprint: BlueprintId,
    position: GridPosition,
    rotation: Rotation,
    exclude: Option<ItemId>,
) -> Result<Rect, PlacementError> {
    let bounds = bounding_box(catalog, blueprint, position, rotation)
        .ok_or(PlacementError::UnknownBlueprint(blueprint))?;

    if !config.bounds().contains_rect(&bounds) {
        return Err(PlacementError::OutOfBounds { bounds });
    }
    if bounds.overlaps(&config.core) {
        return Err(PlacementError::ReservedRegion { bounds });
    }

    for (id, item) in layout.items() {
        if Some(id) == exclude {
            continue;
        }
        let Some(other) = item_bounds(catalog, item) else {
            continue;
        };
        if bounds.overlaps(&other) {
            return Err(PlacementError::Collides { bounds, item: id });
        }
    }

    Ok(bounds)
}

/// Pure placement predicate. See [`check_placement`] for the rules.
pub fn is_placement_valid(
    catalog: &Catalog,
    layout: &Layout,
    config: &GridConfig,
    blueprint: BlueprintId,
    position: GridPosition,
    rotation: Rotation,
    exclude: Option<ItemId>,
) -> bool {
    check_placement(catalog, layout, config, blueprint, position, rotation, exclude).is_ok()
}
