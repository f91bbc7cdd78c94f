use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a machine placed on the grid.
    pub struct ItemId;

    /// Identifies a belt connection between two ports.
    pub struct ConnectionId;
}

/// Identifies a machine blueprint in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlueprintId(pub u32);

/// Identifies a recipe in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies a kind of item carried on belts (ore, plate, gear...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemKindId(pub u32);

/// A single port on a placed item: the item plus the port's index in the
/// blueprint's port list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub item: ItemId,
    pub port: usize,
}

impl PortRef {
    pub fn new(item: ItemId, port: usize) -> Self {
        Self { item, port }
    }
}
