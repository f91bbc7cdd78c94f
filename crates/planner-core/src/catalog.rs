//! Blueprint and recipe catalog.
//!
//! The catalog is the read-only half of a query snapshot: machine
//! definitions, recipes and item-kind names keyed by their ids.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{BlueprintId, ItemKindId, RecipeId};
use crate::model::{MachineBlueprint, ModelError, Recipe};

/// Machine blueprints, recipes and item names available to a layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub blueprints: BTreeMap<BlueprintId, MachineBlueprint>,
    pub recipes: BTreeMap<RecipeId, Recipe>,
    pub item_names: BTreeMap<ItemKindId, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blueprint(&self, id: BlueprintId) -> Option<&MachineBlueprint> {
        self.blueprints.get(&id)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(&id)
    }

    pub fn item_name(&self, id: ItemKindId) -> Option<&str> {
        self.item_names.get(&id).map(String::as_str)
    }

    /// Insert or replace a blueprint, keyed by its own id.
    pub fn insert_blueprint(&mut self, blueprint: MachineBlueprint) {
        self.blueprints.insert(blueprint.id, blueprint);
    }

    /// Insert or replace a recipe, keyed by its own id.
    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.id, recipe);
    }

    /// Recipes that can run on the given blueprint.
    pub fn recipes_for(&self, blueprint: BlueprintId) -> impl Iterator<Item = &Recipe> {
        self.recipes.values().filter(move |r| r.blueprint == blueprint)
    }

    /// One past the highest blueprint id, or `None` once `u32::MAX` is taken.
    pub fn next_blueprint_id(&self) -> Option<BlueprintId> {
        match self.blueprints.keys().next_back() {
            Some(id) => id.0.checked_add(1).map(BlueprintId),
            None => Some(BlueprintId(0)),
        }
    }

    /// One past the highest recipe id, or `None` once `u32::MAX` is taken.
    pub fn next_recipe_id(&self) -> Option<RecipeId> {
        match self.recipes.keys().next_back() {
            Some(id) => id.0.checked_add(1).map(RecipeId),
            None => Some(RecipeId(0)),
        }
    }

    /// Validate every blueprint and recipe.
    pub fn validate(&self) -> Result<(), ModelError> {
        for blueprint in self.blueprints.values() {
            blueprint.validate()?;
        }
        for recipe in self.recipes.values() {
            recipe.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn lookup_by_id() {
        let catalog = sample_catalog();
        assert_eq!(catalog.blueprint(assembler()).unwrap().name, "assembler");
        assert!(catalog.blueprint(BlueprintId(999)).is_none());
        assert_eq!(catalog.recipe(gear_recipe()).unwrap().name, "gear");
        assert_eq!(catalog.item_name(iron_plate()), Some("iron_plate"));
    }

    #[test]
    fn recipes_for_filters_by_blueprint() {
        let catalog = sample_catalog();
        let names: Vec<_> = catalog.recipes_for(assembler()).map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["gear", "circuit"]);
        assert_eq!(catalog.recipes_for(splitter()).count(), 0);
    }

    #[test]
    fn next_ids_follow_highest() {
        let catalog = sample_catalog();
        let highest = catalog.blueprints.keys().max().unwrap().0;
        assert_eq!(catalog.next_blueprint_id(), Some(BlueprintId(highest + 1)));
        assert_eq!(Catalog::new().next_recipe_id(), Some(RecipeId(0)));
    }

    #[test]
    fn next_ids_run_out_at_u32_max() {
        let mut catalog = sample_catalog();
        let mut last = catalog.blueprint(relay()).cloned().unwrap();
        last.id = BlueprintId(u32::MAX);
        catalog.insert_blueprint(last);
        assert_eq!(catalog.next_blueprint_id(), None);

        let mut recipe = catalog.recipe(ore_recipe()).cloned().unwrap();
        recipe.id = RecipeId(u32::MAX);
        catalog.insert_recipe(recipe);
        assert_eq!(catalog.next_recipe_id(), None);
    }

    #[test]
    fn sample_catalog_is_valid() {
        assert!(sample_catalog().validate().is_ok());
    }
}
