//! Reads data files, resolves names, and builds a catalog.
//!
//! A data directory holds `blueprints.{ron,toml,json}` (required),
//! `recipes.*` and `grid.*` (both optional). Exactly one format per base
//! name is allowed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use planner_core::catalog::Catalog;
use planner_core::config::{ConfigError, GridConfig};
use planner_core::fixed::Fixed64;
use planner_core::geometry::GridPosition;
use planner_core::id::{BlueprintId, ItemKindId, RecipeId};
use planner_core::model::{ItemStack, MachineBlueprint, ModelError, Port, Recipe};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::schema::{BlueprintData, RecipeData, StackData};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    #[error("duplicate name '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// A blueprint or recipe failed validation.
    #[error("invalid definition in {file}: {source}")]
    Invalid {
        file: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("invalid grid settings in {file}: {source}")]
    InvalidGrid {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Find `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` if none exists, or `Err(ConflictingFormats)` if more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML cannot hold a bare top-level array, so there the
/// list lives under `toml_key`; RON and JSON files are the list itself.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    if detect_format(path)? != Format::Toml {
        return deserialize_file(path);
    }
    let content = std::fs::read_to_string(path)?;
    let mut table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
    let array = table
        .remove(toml_key)
        .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?;
    array
        .try_into()
        .map_err(|e: toml::de::Error| parse_error(path, e))
}

// ===========================================================================
// Name resolution helpers
// ===========================================================================

/// Look up a name, failing with `UnresolvedRef`.
pub fn resolve_name<'a, V>(
    map: &'a HashMap<String, V>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<&'a V, DataLoadError> {
    map.get(name).ok_or_else(|| DataLoadError::UnresolvedRef {
        file: file.to_path_buf(),
        name: name.to_string(),
        expected_kind,
    })
}

/// Fail with `DuplicateName` if `name` is already taken.
pub fn check_duplicate<V>(
    map: &HashMap<String, V>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if map.contains_key(name) {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    } else {
        Ok(())
    }
}

fn to_fixed(value: f64, file: &Path, field: &str) -> Result<Fixed64, DataLoadError> {
    Fixed64::checked_from_num(value)
        .ok_or_else(|| parse_error(file, format!("{field} {value} is out of range")))
}

// ===========================================================================
// Catalog building
// ===========================================================================

/// Everything a data directory defines.
#[derive(Debug, Clone)]
pub struct PlannerData {
    pub catalog: Catalog,
    /// From `grid.*`, or the default grid when that file is absent.
    pub config: GridConfig,
}

/// Load blueprints, recipes and grid settings from `dir`.
///
/// Blueprint and recipe ids follow file order. Item kinds get ids in the
/// order recipes first mention them.
pub fn load_catalog(dir: &Path) -> Result<PlannerData, DataLoadError> {
    let mut catalog = Catalog::new();

    let blueprints_file = require_data_file(dir, "blueprints")?;
    let blueprint_ids = load_blueprints(&blueprints_file, &mut catalog)?;

    if let Some(recipes_file) = find_data_file(dir, "recipes")? {
        load_recipes(&recipes_file, &blueprint_ids, &mut catalog)?;
    }

    let config = match find_data_file(dir, "grid")? {
        Some(grid_file) => {
            let config: GridConfig = deserialize_file(&grid_file)?;
            config
                .validate()
                .map_err(|source| DataLoadError::InvalidGrid {
                    file: grid_file.clone(),
                    source,
                })?;
            config
        }
        None => GridConfig::default(),
    };

    debug!(
        blueprints = catalog.blueprints.len(),
        recipes = catalog.recipes.len(),
        items = catalog.item_names.len(),
        dir = %dir.display(),
        "catalog loaded"
    );
    Ok(PlannerData { catalog, config })
}

fn load_blueprints(
    file: &Path,
    catalog: &mut Catalog,
) -> Result<HashMap<String, BlueprintId>, DataLoadError> {
    let raw: Vec<BlueprintData> = deserialize_list(file, "blueprints")?;
    let mut ids = HashMap::new();

    for (index, data) in raw.into_iter().enumerate() {
        check_duplicate(&ids, &data.name, file)?;
        let id = BlueprintId(index as u32);
        let blueprint = MachineBlueprint {
            id,
            name: data.name,
            width: data.width,
            height: data.height,
            color: data.color,
            ports: data
                .ports
                .iter()
                .map(|p| Port {
                    kind: p.kind,
                    offset: GridPosition::new(p.x, p.y),
                    direction: p.facing,
                })
                .collect(),
            power_draw: to_fixed(data.power_draw, file, "power_draw")?,
            role: data.role,
        };
        blueprint.validate().map_err(|source| DataLoadError::Invalid {
            file: file.to_path_buf(),
            source,
        })?;
        for (port, p) in blueprint.ports.iter().enumerate() {
            if !p.is_on_facing_edge(blueprint.width, blueprint.height) {
                warn!(
                    blueprint = %blueprint.name,
                    port,
                    facing = ?p.direction,
                    "port is not on the edge it faces"
                );
            }
        }
        ids.insert(blueprint.name.clone(), id);
        catalog.insert_blueprint(blueprint);
    }

    Ok(ids)
}

fn load_recipes(
    file: &Path,
    blueprint_ids: &HashMap<String, BlueprintId>,
    catalog: &mut Catalog,
) -> Result<(), DataLoadError> {
    let raw: Vec<RecipeData> = deserialize_list(file, "recipes")?;
    let mut names: HashMap<String, RecipeId> = HashMap::new();
    let mut items: HashMap<String, ItemKindId> = HashMap::new();

    for (index, data) in raw.into_iter().enumerate() {
        check_duplicate(&names, &data.name, file)?;
        let blueprint = *resolve_name(blueprint_ids, &data.machine, file, "blueprint")?;
        let id = RecipeId(index as u32);

        let mut stacks = |list: &[StackData]| -> Vec<ItemStack> {
            list.iter()
                .map(|s| ItemStack::new(intern(&mut items, catalog, s.item()), s.amount()))
                .collect()
        };
        let inputs = stacks(&data.inputs);
        let outputs = stacks(&data.outputs);

        let recipe = Recipe {
            id,
            name: data.name,
            blueprint,
            duration: to_fixed(data.duration, file, "duration")?,
            inputs,
            outputs,
        };
        recipe.validate().map_err(|source| DataLoadError::Invalid {
            file: file.to_path_buf(),
            source,
        })?;
        names.insert(recipe.name.clone(), id);
        catalog.insert_recipe(recipe);
    }

    Ok(())
}

/// Id for an item name, issuing the next id on first sight.
fn intern(items: &mut HashMap<String, ItemKindId>, catalog: &mut Catalog, name: &str) -> ItemKindId {
    if let Some(&id) = items.get(name) {
        return id;
    }
    let id = ItemKindId(items.len() as u32);
    items.insert(name.to_string(), id);
    catalog.item_names.insert(id, name.to_string());
    id
}

// ===========================================================================
// Tests
// ===========================================================================
