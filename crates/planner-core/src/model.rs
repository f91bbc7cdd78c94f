//! Machine, recipe and placement data.

use fixed::types::I64F64;
use serde::{Deserialize, Serialize};

use crate::fixed::Fixed64;
use crate::geometry::{
    effective_dimensions, rotated_direction, rotated_port_offset, Direction, GridPosition, Rect,
    Rotation,
};
use crate::id::{BlueprintId, ItemKindId, PortRef, RecipeId};

/// Largest width or height a blueprint may have.
pub const MAX_BLUEPRINT_SIDE: u32 = 10;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from validating catalog entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("blueprint {id:?} has invalid size {width}x{height} (each side must be 1..={max})", max = MAX_BLUEPRINT_SIDE)]
    InvalidSize {
        id: BlueprintId,
        width: u32,
        height: u32,
    },
    #[error("blueprint {id:?} port {port} at ({x}, {y}) lies outside the footprint")]
    PortOutOfBounds {
        id: BlueprintId,
        port: usize,
        x: i32,
        y: i32,
    },
    #[error("blueprint {id:?} has negative power draw")]
    NegativePowerDraw { id: BlueprintId },
    #[error("recipe {id:?} must have a positive duration")]
    NonPositiveDuration { id: RecipeId },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Whether a port receives or emits items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortKind {
    Input,
    Output,
}

/// A belt attachment point on a blueprint, in unrotated coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Port {
    pub kind: PortKind,
    pub offset: GridPosition,
    pub direction: Direction,
}

impl Port {
    pub fn input(x: i32, y: i32, direction: Direction) -> Self {
        Self {
            kind: PortKind::Input,
            offset: GridPosition::new(x, y),
            direction,
        }
    }

    pub fn output(x: i32, y: i32, direction: Direction) -> Self {
        Self {
            kind: PortKind::Output,
            offset: GridPosition::new(x, y),
            direction,
        }
    }

    pub fn is_input(&self) -> bool {
        self.kind == PortKind::Input
    }

    pub fn is_output(&self) -> bool {
        self.kind == PortKind::Output
    }

    /// True if the port sits on the footprint edge it faces.
    ///
    /// Interior ports are tolerated by every query, but the editor never
    /// authors them.
    pub fn is_on_facing_edge(&self, width: u32, height: u32) -> bool {
        let (w, h) = (width as i32, height as i32);
        match self.direction {
            Direction::North => self.offset.y == 0,
            Direction::South => self.offset.y == h - 1,
            Direction::West => self.offset.x == 0,
            Direction::East => self.offset.x == w - 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Blueprints
// ---------------------------------------------------------------------------

/// How a machine behaves in the throughput and power graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Runs its assigned recipe.
    #[default]
    Production,
    /// Divides its incoming flow evenly across its outgoing belts.
    Splitter,
    /// Combines all incoming flow into its output.
    Merger,
    /// Extends the reach of the power network.
    Relay,
}

/// A machine definition: footprint, ports, and power draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineBlueprint {
    pub id: BlueprintId,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color: String,
    pub ports: Vec<Port>,
    #[serde(default)]
    pub power_draw: Fixed64,
    #[serde(default)]
    pub role: DeviceRole,
}

impl MachineBlueprint {
    /// Look up a port by index. Out-of-range indices yield `None`.
    pub fn port(&self, index: usize) -> Option<&Port> {
        self.ports.get(index)
    }

    /// Indices of the input ports, in port-list order.
    pub fn input_ports(&self) -> impl Iterator<Item = usize> + '_ {
        self.ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_input())
            .map(|(i, _)| i)
    }

    pub fn output_port_count(&self) -> usize {
        self.ports.iter().filter(|p| p.is_output()).count()
    }

    /// Footprint size after rotation.
    pub fn dimensions(&self, rotation: Rotation) -> (u32, u32) {
        effective_dimensions(self.width, self.height, rotation)
    }

    /// The rectangle covered when placed at `position` with `rotation`.
    pub fn footprint_at(&self, position: GridPosition, rotation: Rotation) -> Rect {
        let (w, h) = self.dimensions(rotation);
        Rect::new(position.x, position.y, w, h)
    }

    /// A port's offset and facing inside the rotated footprint.
    pub fn rotated_port(&self, index: usize, rotation: Rotation) -> Option<(GridPosition, Direction)> {
        let port = self.port(index)?;
        Some((
            rotated_port_offset(port.offset, self.width, self.height, rotation),
            rotated_direction(port.direction, rotation),
        ))
    }

    /// Check size, port bounds and power draw.
    pub fn validate(&self) -> Result<(), ModelError> {
        let side = 1..=MAX_BLUEPRINT_SIDE;
        if !side.contains(&self.width) || !side.contains(&self.height) {
            return Err(ModelError::InvalidSize {
                id: self.id,
                width: self.width,
                height: self.height,
            });
        }
        let bounds = Rect::new(0, 0, self.width, self.height);
        for (index, port) in self.ports.iter().enumerate() {
            if !bounds.contains(port.offset) {
                return Err(ModelError::PortOutOfBounds {
                    id: self.id,
                    port: index,
                    x: port.offset.x,
                    y: port.offset.y,
                });
            }
        }
        if self.power_draw < Fixed64::ZERO {
            return Err(ModelError::NegativePowerDraw { id: self.id });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// An amount of one item kind consumed or produced per craft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemKindId,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(item: ItemKindId, amount: u32) -> Self {
        Self { item, amount }
    }
}

/// A timed conversion run by one kind of machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub blueprint: BlueprintId,
    /// Seconds per craft.
    pub duration: Fixed64,
    pub inputs: Vec<ItemStack>,
    pub outputs: Vec<ItemStack>,
}

impl Recipe {
    /// Total items emitted per second across every output stack.
    /// Zero when the duration is not positive. Saturates at `Fixed64::MAX`.
    pub fn output_per_second(&self) -> Fixed64 {
        if self.duration <= Fixed64::ZERO {
            return Fixed64::ZERO;
        }
        // Amounts are summed wide; only the final rate is narrowed.
        let total: u64 = self.outputs.iter().map(|s| u64::from(s.amount)).sum();
        I64F64::saturating_from_num(total)
            .checked_div(I64F64::from_num(self.duration))
            .map_or(Fixed64::MAX, Fixed64::saturating_from_num)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.duration <= Fixed64::ZERO {
            return Err(ModelError::NonPositiveDuration { id: self.id });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// A machine instance on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedItem {
    pub blueprint: BlueprintId,
    /// Top-left cell of the rotated footprint.
    pub position: GridPosition,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub recipe: Option<RecipeId>,
}

impl PlacedItem {
    pub fn new(blueprint: BlueprintId, position: GridPosition, rotation: Rotation) -> Self {
        Self {
            blueprint,
            position,
            rotation,
            recipe: None,
        }
    }
}

/// A belt from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: PortRef,
    pub target: PortRef,
}
