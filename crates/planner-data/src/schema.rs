//! On-disk shapes for blueprints and recipes.
//!
//! Data files refer to blueprints and item kinds by name. The loader turns
//! these structs into catalog types, assigning ids in file order.

use planner_core::geometry::Direction;
use planner_core::model::{DeviceRole, PortKind};
use serde::Deserialize;

// ===========================================================================
// Blueprints
// ===========================================================================

/// A machine definition in `blueprints.*`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlueprintData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub ports: Vec<PortData>,
    #[serde(default)]
    pub power_draw: f64,
    #[serde(default)]
    pub role: DeviceRole,
}

fn default_color() -> String {
    "#808080".to_string()
}

/// A port on a blueprint, in unrotated footprint coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct PortData {
    pub kind: PortKind,
    pub x: i32,
    pub y: i32,
    pub facing: Direction,
}

// ===========================================================================
// Recipes
// ===========================================================================

/// An item amount, either `("iron_plate", 2)` or `{ item = "iron_plate", amount = 2 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StackData {
    Short(String, u32),
    Full { item: String, amount: u32 },
}

impl StackData {
    pub fn item(&self) -> &str {
        match self {
            StackData::Short(item, _) | StackData::Full { item, .. } => item,
        }
    }

    pub fn amount(&self) -> u32 {
        match self {
            StackData::Short(_, amount) | StackData::Full { amount, .. } => *amount,
        }
    }
}

/// A recipe in `recipes.*`. `machine` names the blueprint it runs on;
/// `duration` is in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeData {
    pub name: String,
    pub machine: String,
    pub duration: f64,
    #[serde(default)]
    pub inputs: Vec<StackData>,
    pub outputs: Vec<StackData>,
}
