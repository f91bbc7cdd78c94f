//! The single owner of a planner's mutable state.
//!
//! A [`Session`] holds the grid configuration, the catalog and the layout.
//! Every edit is validated before anything changes, so a failed call leaves
//! the session exactly as it was. Queries hand the current state to the
//! stateless planner crates by reference.

use std::collections::BTreeMap;

use planner_core::catalog::Catalog;
use planner_core::config::{ConfigError, GridConfig};
use planner_core::fixed::Fixed64;
use planner_core::geometry::{GridPosition, Rect, Rotation};
use planner_core::id::{BlueprintId, ConnectionId, ItemId, PortRef, RecipeId};
use planner_core::layout::Layout;
use planner_core::model::{Connection, MachineBlueprint, ModelError, PlacedItem, PortKind, Recipe};
use planner_power::{PowerCoverage, PowerReport};
use planner_spatial::{BeltRoute, PlacementError};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an edit was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("item not found: {0:?}")]
    ItemNotFound(ItemId),
    #[error("connection not found: {0:?}")]
    ConnectionNotFound(ConnectionId),
    #[error("blueprint not found: {0:?}")]
    BlueprintNotFound(BlueprintId),
    #[error("recipe not found: {0:?}")]
    RecipeNotFound(RecipeId),
    #[error("port not found: {0:?}")]
    PortNotFound(PortRef),
    #[error("port {port:?} is not an {expected:?} port")]
    WrongPortKind { port: PortRef, expected: PortKind },
    #[error("port {0:?} already has a belt")]
    PortInUse(PortRef),
    #[error("no free {0} id left in the catalog")]
    CatalogFull(&'static str),
    #[error("recipe {recipe:?} does not run on blueprint {blueprint:?}")]
    RecipeMismatch {
        recipe: RecipeId,
        blueprint: BlueprintId,
    },
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Grid configuration, catalog and layout behind one validated API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    config: GridConfig,
    catalog: Catalog,
    layout: Layout,
}

impl Session {
    /// Start an empty layout. The config, every blueprint and every recipe
    /// are validated, and recipes must target a known blueprint.
    pub fn new(config: GridConfig, catalog: Catalog) -> Result<Self, SessionError> {
        config.validate()?;
        catalog.validate()?;
        if let Some(orphan) = catalog
            .recipes
            .values()
            .find(|r| catalog.blueprint(r.blueprint).is_none())
        {
            return Err(SessionError::BlueprintNotFound(orphan.blueprint));
        }
        Ok(Self {
            config,
            catalog,
            layout: Layout::new(),
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    fn placed(&self, item: ItemId) -> Result<&PlacedItem, SessionError> {
        self.layout.item(item).ok_or(SessionError::ItemNotFound(item))
    }

    // -- Placement --

    /// Place a machine after checking bounds, the core and collisions.
    pub fn place(
        &mut self,
        blueprint: BlueprintId,
        position: GridPosition,
        rotation: Rotation,
    ) -> Result<ItemId, SessionError> {
        self.check_placement(blueprint, position, rotation, None)?;
        Ok(self
            .layout
            .insert_item(PlacedItem::new(blueprint, position, rotation)))
    }

    /// Move an item, keeping its rotation.
    pub fn move_item(&mut self, item: ItemId, position: GridPosition) -> Result<(), SessionError> {
        let current = self.placed(item)?;
        let (blueprint, rotation) = (current.blueprint, current.rotation);
        self.check_placement(blueprint, position, rotation, Some(item))?;
        if let Some(placed) = self.layout.item_mut(item) {
            placed.position = position;
        }
        Ok(())
    }

    /// Turn an item 90° clockwise in place.
    pub fn rotate_item(&mut self, item: ItemId) -> Result<Rotation, SessionError> {
        let next = self.placed(item)?.rotation.rotate_cw();
        self.set_rotation(item, next)?;
        Ok(next)
    }

    /// Set an item's rotation, keeping its position.
    pub fn set_rotation(&mut self, item: ItemId, rotation: Rotation) -> Result<(), SessionError> {
        let current = self.placed(item)?;
        let (blueprint, position) = (current.blueprint, current.position);
        self.check_placement(blueprint, position, rotation, Some(item))?;
        if let Some(placed) = self.layout.item_mut(item) {
            placed.rotation = rotation;
        }
        Ok(())
    }

    /// Remove an item and every belt attached to it.
    pub fn remove_item(&mut self, item: ItemId) -> Result<PlacedItem, SessionError> {
        self.layout
            .remove_item(item)
            .ok_or(SessionError::ItemNotFound(item))
    }

    // -- Catalog edits --

    /// Add a blueprint under a fresh id, which is returned.
    pub fn add_blueprint(&mut self, mut blueprint: MachineBlueprint) -> Result<BlueprintId, SessionError> {
        blueprint.id = self
            .catalog
            .next_blueprint_id()
            .ok_or(SessionError::CatalogFull("blueprint"))?;
        blueprint.validate()?;
        let id = blueprint.id;
        self.catalog.insert_blueprint(blueprint);
        Ok(id)
    }

    /// Replace an existing blueprint. Placed instances keep their position
    /// and rotation. Belts whose ports no longer exist, or changed
    /// direction, are removed and returned.
    pub fn update_blueprint(
        &mut self,
        blueprint: MachineBlueprint,
    ) -> Result<Vec<ConnectionId>, SessionError> {
        if self.catalog.blueprint(blueprint.id).is_none() {
            return Err(SessionError::BlueprintNotFound(blueprint.id));
        }
        blueprint.validate()?;
        self.catalog.insert_blueprint(blueprint);

        let stale: Vec<ConnectionId> = self
            .layout
            .connections()
            .filter(|(_, c)| !self.wiring_holds(c))
            .map(|(id, _)| id)
            .collect();
        for &id in &stale {
            self.layout.remove_connection(id);
        }
        if !stale.is_empty() {
            debug!(removed = stale.len(), "blueprint update dropped belts");
        }
        Ok(stale)
    }

    /// Remove a blueprint with its placed instances, their belts, and the
    /// recipes that run on it. Returns the removed items.
    pub fn remove_blueprint(&mut self, blueprint: BlueprintId) -> Result<Vec<ItemId>, SessionError> {
        if self.catalog.blueprints.remove(&blueprint).is_none() {
            return Err(SessionError::BlueprintNotFound(blueprint));
        }
        let recipes: Vec<RecipeId> = self
            .catalog
            .recipes_for(blueprint)
            .map(|r| r.id)
            .collect();
        for recipe in recipes {
            self.drop_recipe(recipe);
        }
        let removed = self.layout.remove_instances_of(blueprint);
        debug!(?blueprint, items = removed.len(), "blueprint removed");
        Ok(removed)
    }

    /// Add a recipe under a fresh id, which is returned.
    pub fn add_recipe(&mut self, mut recipe: Recipe) -> Result<RecipeId, SessionError> {
        if self.catalog.blueprint(recipe.blueprint).is_none() {
            return Err(SessionError::BlueprintNotFound(recipe.blueprint));
        }
        recipe.id = self
            .catalog
            .next_recipe_id()
            .ok_or(SessionError::CatalogFull("recipe"))?;
        recipe.validate()?;
        let id = recipe.id;
        self.catalog.insert_recipe(recipe);
        Ok(id)
    }

    /// Remove a recipe and clear it from every item running it.
    pub fn remove_recipe(&mut self, recipe: RecipeId) -> Result<Recipe, SessionError> {
        self.drop_recipe(recipe)
            .ok_or(SessionError::RecipeNotFound(recipe))
    }

    fn drop_recipe(&mut self, recipe: RecipeId) -> Option<Recipe> {
        let removed = self.catalog.recipes.remove(&recipe)?;
        let running: Vec<ItemId> = self
            .layout
            .items()
            .filter(|(_, item)| item.recipe == Some(recipe))
            .map(|(id, _)| id)
            .collect();
        for id in running {
            if let Some(item) = self.layout.item_mut(id) {
                item.recipe = None;
            }
        }
        Some(removed)
    }

    /// Assign a recipe to an item, or clear it with `None`. The recipe must
    /// run on the item's blueprint.
    pub fn assign_recipe(&mut self, item: ItemId, recipe: Option<RecipeId>) -> Result<(), SessionError> {
        let blueprint = self.placed(item)?.blueprint;
        if let Some(id) = recipe {
            let found = self
                .catalog
                .recipe(id)
                .ok_or(SessionError::RecipeNotFound(id))?;
            if found.blueprint != blueprint {
                return Err(SessionError::RecipeMismatch {
                    recipe: id,
                    blueprint,
                });
            }
        }
        if let Some(placed) = self.layout.item_mut(item) {
            placed.recipe = recipe;
        }
        Ok(())
    }

    // -- Wiring --

    /// Lay a belt from an output port to an input port. Each port carries at
    /// most one belt. Both ends may be on the same item.
    pub fn connect(&mut self, source: PortRef, target: PortRef) -> Result<ConnectionId, SessionError> {
        self.expect_port(source, PortKind::Output)?;
        self.expect_port(target, PortKind::Input)?;
        if self.layout.connection_from_port(source).is_some() {
            return Err(SessionError::PortInUse(source));
        }
        if self.layout.connection_into_port(target).is_some() {
            return Err(SessionError::PortInUse(target));
        }
        Ok(self.layout.insert_connection(Connection { source, target }))
    }

    pub fn disconnect(&mut self, connection: ConnectionId) -> Result<Connection, SessionError> {
        self.layout
            .remove_connection(connection)
            .ok_or(SessionError::ConnectionNotFound(connection))
    }

    fn expect_port(&self, port: PortRef, expected: PortKind) -> Result<(), SessionError> {
        self.placed(port.item)?;
        let found = self
            .layout
            .port(&self.catalog, port)
            .ok_or(SessionError::PortNotFound(port))?;
        if found.kind != expected {
            return Err(SessionError::WrongPortKind { port, expected });
        }
        Ok(())
    }

    fn wiring_holds(&self, connection: &Connection) -> bool {
        let kind = |port| self.layout.port(&self.catalog, port).map(|p| p.kind);
        kind(connection.source) == Some(PortKind::Output)
            && kind(connection.target) == Some(PortKind::Input)
    }

    // -- Queries --

    /// Footprint of a placed item.
    pub fn bounding_box(&self, item: ItemId) -> Option<Rect> {
        planner_spatial::item_bounds(&self.catalog, self.layout.item(item)?)
    }

    pub fn is_placement_valid(
        &self,
        blueprint: BlueprintId,
        position: GridPosition,
        rotation: Rotation,
        exclude: Option<ItemId>,
    ) -> bool {
        self.check_placement(blueprint, position, rotation, exclude)
            .is_ok()
    }

    pub fn check_placement(
        &self,
        blueprint: BlueprintId,
        position: GridPosition,
        rotation: Rotation,
        exclude: Option<ItemId>,
    ) -> Result<Rect, PlacementError> {
        planner_spatial::check_placement(
            &self.catalog,
            &self.layout,
            &self.config,
            blueprint,
            position,
            rotation,
            exclude,
        )
    }

    /// Belt route for one connection.
    pub fn route(&self, connection: ConnectionId) -> Option<BeltRoute> {
        let connection = self.layout.connection(connection)?;
        planner_spatial::route_connection(&self.catalog, &self.layout, &self.config, connection)
    }

    /// Belt routes for every connection.
    pub fn routes(&self) -> BTreeMap<ConnectionId, BeltRoute> {
        planner_spatial::route_all(&self.catalog, &self.layout, &self.config)
    }

    pub fn power_coverage(&self) -> PowerCoverage {
        planner_power::propagate_power(&self.catalog, &self.layout, &self.config)
    }

    pub fn power_report(&self) -> PowerReport {
        planner_power::power_report(&self.catalog, &self.layout, &self.config)
    }

    /// Items per minute on every connection.
    pub fn throughput(&self) -> BTreeMap<ConnectionId, Fixed64> {
        planner_flow::compute_throughput(&self.catalog, &self.layout)
    }

    /// Items per minute emitted by one machine.
    pub fn item_output_rate(&self, item: ItemId) -> Fixed64 {
        planner_flow::item_output_rate(&self.catalog, &self.layout, item)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
