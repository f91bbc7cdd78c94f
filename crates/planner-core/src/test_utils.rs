//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::catalog::Catalog;
use crate::config::GridConfig;
use crate::fixed::Fixed64;
use crate::geometry::{Direction, GridPosition, Rotation};
use crate::id::*;
use crate::layout::Layout;
use crate::model::*;

// ===========================================================================
// Fixed-point helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// True when `actual` is within 1e-6 of `expected`.
pub fn approx_eq(actual: Fixed64, expected: f64) -> bool {
    (actual.to_num::<f64>() - expected).abs() < 1e-6
}

// ===========================================================================
// Item kinds
// ===========================================================================

pub fn iron_ore() -> ItemKindId {
    ItemKindId(0)
}
pub fn iron_plate() -> ItemKindId {
    ItemKindId(1)
}
pub fn copper_plate() -> ItemKindId {
    ItemKindId(2)
}
pub fn gear() -> ItemKindId {
    ItemKindId(3)
}
pub fn circuit() -> ItemKindId {
    ItemKindId(4)
}

// ===========================================================================
// Blueprints
// ===========================================================================

/// 2x2, one output on the east edge.
pub fn miner() -> BlueprintId {
    BlueprintId(0)
}
/// 3x2, two inputs on the west edge, one output on the east edge.
pub fn assembler() -> BlueprintId {
    BlueprintId(1)
}
/// 1x1, input from the west, outputs north/east/south.
pub fn splitter() -> BlueprintId {
    BlueprintId(2)
}
/// 1x1, inputs west/north/south, output east.
pub fn merger() -> BlueprintId {
    BlueprintId(3)
}
/// 1x1 power relay, no ports.
pub fn relay() -> BlueprintId {
    BlueprintId(4)
}

// ===========================================================================
// Recipes
// ===========================================================================

/// Miner: nothing -> 1 iron ore every 2 s.
pub fn ore_recipe() -> RecipeId {
    RecipeId(0)
}
/// Assembler: 2 iron plate -> 1 gear every 1 s.
pub fn gear_recipe() -> RecipeId {
    RecipeId(1)
}
/// Assembler: iron plate + copper plate -> 1 circuit every 3 s.
pub fn circuit_recipe() -> RecipeId {
    RecipeId(2)
}

fn blueprint(
    id: BlueprintId,
    name: &str,
    (width, height): (u32, u32),
    ports: Vec<Port>,
    power_draw: f64,
    role: DeviceRole,
) -> MachineBlueprint {
    MachineBlueprint {
        id,
        name: name.to_string(),
        width,
        height,
        color: "#808080".to_string(),
        ports,
        power_draw: fixed(power_draw),
        role,
    }
}

/// A catalog with the five sample blueprints and three recipes above.
pub fn sample_catalog() -> Catalog {
    let mut catalog = Catalog::new();

    catalog.insert_blueprint(blueprint(
        miner(),
        "miner",
        (2, 2),
        vec![Port::output(1, 0, Direction::East)],
        90.0,
        DeviceRole::Production,
    ));
    catalog.insert_blueprint(blueprint(
        assembler(),
        "assembler",
        (3, 2),
        vec![
            Port::input(0, 0, Direction::West),
            Port::input(0, 1, Direction::West),
            Port::output(2, 1, Direction::East),
        ],
        75.0,
        DeviceRole::Production,
    ));
    catalog.insert_blueprint(blueprint(
        splitter(),
        "splitter",
        (1, 1),
        vec![
            Port::input(0, 0, Direction::West),
            Port::output(0, 0, Direction::North),
            Port::output(0, 0, Direction::East),
            Port::output(0, 0, Direction::South),
        ],
        0.0,
        DeviceRole::Splitter,
    ));
    catalog.insert_blueprint(blueprint(
        merger(),
        "merger",
        (1, 1),
        vec![
            Port::input(0, 0, Direction::West),
            Port::input(0, 0, Direction::North),
            Port::input(0, 0, Direction::South),
            Port::output(0, 0, Direction::East),
        ],
        0.0,
        DeviceRole::Merger,
    ));
    catalog.insert_blueprint(blueprint(
        relay(),
        "relay",
        (1, 1),
        Vec::new(),
        0.0,
        DeviceRole::Relay,
    ));

    catalog.insert_recipe(Recipe {
        id: ore_recipe(),
        name: "iron_ore".to_string(),
        blueprint: miner(),
        duration: fixed(2.0),
        inputs: Vec::new(),
        outputs: vec![ItemStack::new(iron_ore(), 1)],
    });
    catalog.insert_recipe(Recipe {
        id: gear_recipe(),
        name: "gear".to_string(),
        blueprint: assembler(),
        duration: fixed(1.0),
        inputs: vec![ItemStack::new(iron_plate(), 2)],
        outputs: vec![ItemStack::new(gear(), 1)],
    });
    catalog.insert_recipe(Recipe {
        id: circuit_recipe(),
        name: "circuit".to_string(),
        blueprint: assembler(),
        duration: fixed(3.0),
        inputs: vec![
            ItemStack::new(iron_plate(), 1),
            ItemStack::new(copper_plate(), 1),
        ],
        outputs: vec![ItemStack::new(circuit(), 1)],
    });

    for (id, name) in [
        (iron_ore(), "iron_ore"),
        (iron_plate(), "iron_plate"),
        (copper_plate(), "copper_plate"),
        (gear(), "gear"),
        (circuit(), "circuit"),
    ] {
        catalog.item_names.insert(id, name.to_string());
    }

    catalog
}

// ===========================================================================
// Grid / layout helpers
// ===========================================================================

/// A 20x20 grid with a 4x4 core at (8, 8).
pub fn small_config() -> GridConfig {
    GridConfig::with_size(20, 20, 4)
}

pub fn place(layout: &mut Layout, blueprint: BlueprintId, x: i32, y: i32) -> ItemId {
    place_rotated(layout, blueprint, x, y, Rotation::None)
}

pub fn place_rotated(
    layout: &mut Layout,
    blueprint: BlueprintId,
    x: i32,
    y: i32,
    rotation: Rotation,
) -> ItemId {
    layout.insert_item(PlacedItem::new(blueprint, GridPosition::new(x, y), rotation))
}

/// Place an item with a recipe already assigned.
pub fn place_with_recipe(
    layout: &mut Layout,
    blueprint: BlueprintId,
    recipe: RecipeId,
    x: i32,
    y: i32,
) -> ItemId {
    let id = place(layout, blueprint, x, y);
    if let Some(item) = layout.item_mut(id) {
        item.recipe = Some(recipe);
    }
    id
}

/// Insert a connection without any wiring checks.
pub fn connect(
    layout: &mut Layout,
    from: ItemId,
    from_port: usize,
    to: ItemId,
    to_port: usize,
) -> ConnectionId {
    layout.insert_connection(Connection {
        source: PortRef::new(from, from_port),
        target: PortRef::new(to, to_port),
    })
}
