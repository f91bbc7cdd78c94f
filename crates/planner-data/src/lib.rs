//! Loading catalogs and grid settings from RON, TOML or JSON data files.

pub mod loader;
pub mod schema;

pub use loader::{load_catalog, DataLoadError, PlannerData};
