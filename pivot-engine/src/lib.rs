//! FILENAME: pivot-engine/src/lib.rs
//! Pivot column materialization.
//!
//! An upstream aggregation step returns a wide result whose pivot columns
//! are named `<id>-<id>[-<id>]::<aggregate>`. This crate decodes those names,
//! labels them from per-container type catalogs and decides which columns
//! are visible by default. It depends on `container-scope` only for the
//! shared `ContainerId` type.
//!
//! Layers:
//! - `definition`: Pivot variants and their dimension bindings (what a key MEANS)
//! - `catalog`: Per-container identifier -> label maps (what ids are CALLED)
//! - `decoder`: Raw column name -> resolved key (HOW we read names)
//! - `engine`: Labeling, naming and visibility (HOW we materialize)
//! - `view`: Serializable output for the query layer (WHAT we expose)

pub mod catalog;
pub mod decoder;
pub mod definition;
pub mod engine;
pub mod error;
pub mod view;


pub use catalog::*;
pub use decoder::*;
pub use definition::*;
pub use engine::{
    build_pivot_table, compose_label, legal_name, materialize_pivot, PivotMaterializer,
};
pub use error::{PivotError, ProviderError};
pub use view::*;
