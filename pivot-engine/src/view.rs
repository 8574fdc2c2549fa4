//! FILENAME: pivot-engine/src/view.rs
//! Materialized Pivot Table - the column metadata handed to the query layer.
//!
//! Everything here is plain, serializable output: labeled columns with their
//! visibility, the passthrough columns, the default-visible list and a
//! report of the pivot-shaped columns that were dropped.

use container_scope::ContainerId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::decoder::{DecodeRejection, DecodedPivotKey, RejectionKind};
use crate::definition::{LookupTarget, MAX_ARITY};

/// How many dropped raw names a `DropReport` keeps as examples.
pub const MAX_DROP_SAMPLES: usize = 8;

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnVisibility {
    /// Part of the default view.
    Visible,
    /// Selectable, but not shown until the user asks for it.
    Hidden,
}

/// One decoded pivot column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedColumn {
    /// Identifier-safe name, unique within the table. When two labels map
    /// to the same name, later columns in raw order get `_2`, `_3`, ...; the
    /// suffix a column receives therefore depends on raw column order.
    pub name: String,
    /// Display label, e.g. "Plasma:Frozen:SiteX_Sum".
    pub label: String,
    /// Raw column in the aggregate result this column reads from.
    pub source_column: String,
    pub key: DecodedPivotKey,
    /// Catalog each key segment was labeled from, in key order.
    pub lookups: SmallVec<[LookupTarget; MAX_ARITY]>,
    pub visibility: ColumnVisibility,
}

impl MaterializedColumn {
    pub fn is_visible(&self) -> bool {
        self.visibility == ColumnVisibility::Visible
    }
}

// ============================================================================
// DROP REPORT
// ============================================================================

/// Pivot-shaped columns left out of the table because their key did not
/// decode or resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReport {
    pub total: usize,
    pub arity_mismatch: usize,
    pub non_numeric_segment: usize,
    pub unknown_identifier: usize,
    /// First few dropped raw names, in raw order.
    pub samples: Vec<String>,
}

impl DropReport {
    pub fn record(&mut self, raw: &str, rejection: &DecodeRejection) {
        self.total += 1;
        match rejection.kind() {
            RejectionKind::ArityMismatch => self.arity_mismatch += 1,
            RejectionKind::NonNumericSegment => self.non_numeric_segment += 1,
            RejectionKind::UnknownIdentifier => self.unknown_identifier += 1,
        }
        if self.samples.len() < MAX_DROP_SAMPLES {
            self.samples.push(raw.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

// ============================================================================
// TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializedTable {
    /// Name of the pivot definition this table was built for.
    pub pivot: String,
    /// Container whose catalogs labeled the columns.
    pub container: ContainerId,
    /// Decoded pivot columns in raw order.
    pub columns: Vec<MaterializedColumn>,
    /// Raw columns that are not pivot columns, unmodified and in raw order.
    pub passthrough_columns: Vec<String>,
    /// Leading columns, then visible pivot column names in raw order.
    pub default_visible_columns: Vec<String>,
    pub dropped: DropReport,
}

impl MaterializedTable {
    pub fn column(&self, name: &str) -> Option<&MaterializedColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_for_source(&self, raw: &str) -> Option<&MaterializedColumn> {
        self.columns.iter().find(|column| column.source_column == raw)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &MaterializedColumn> {
        self.columns.iter().filter(|column| column.is_visible())
    }

    pub fn hidden_columns(&self) -> impl Iterator<Item = &MaterializedColumn> {
        self.columns.iter().filter(|column| !column.is_visible())
    }
}
