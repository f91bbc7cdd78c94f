//! Planner Core -- shared types for the factory layout planner.
//!
//! This crate holds everything the query crates agree on: identifiers,
//! fixed-point numbers, grid geometry and rotation, the machine/recipe data
//! model, and the layout snapshot that callers hand to every query.
//!
//! # Snapshot Pattern
//!
//! None of the planner crates keep state between calls. A caller owns a
//! [`catalog::Catalog`], a [`layout::Layout`] and a [`config::GridConfig`]
//! and passes them by reference into each query:
//!
//! ```rust,ignore
//! let valid = planner_spatial::is_placement_valid(
//!     &catalog, &layout, &config, blueprint, GridPosition::new(3, 4), Rotation::None, None,
//! );
//! ```
//!
//! # Key Types
//!
//! - [`geometry::Rotation`], [`geometry::Direction`], [`geometry::Rect`] --
//!   rotation transform and AABB math.
//! - [`model::MachineBlueprint`] -- machine footprint, ports and role.
//! - [`model::Recipe`] -- timed conversion of item stacks.
//! - [`layout::Layout`] -- placed items and belt connections.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for deterministic rates.

pub mod catalog;
pub mod config;
pub mod fixed;
pub mod geometry;
pub mod id;
pub mod layout;
pub mod model;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
