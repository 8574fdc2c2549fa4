//! FILENAME: pivot-engine/src/definition.rs
//! Pivot Definition - What a pivoted result set looks like.
//!
//! A pivot definition names the ordered dimensions encoded in each pivot
//! column and the fixed leading columns shown ahead of them. Every pivot
//! variant (by primary type, by derivative, by requesting location, ...) is
//! one value of `PivotDefinition`; decoding and materialization are generic
//! over it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::PivotError;

/// Separates the key segment from the aggregate tag: `1-5::Count`.
pub const AGG_DELIM: &str = "::";

/// Separates dimension identifiers inside the key segment: `1-5-9`.
pub const TYPE_DELIM: &str = "-";

/// Most dimensions a single pivot key may carry.
pub const MAX_ARITY: usize = 3;

/// Default subject column, always first in the default-visible list.
pub const SUBJECT_COLUMN: &str = "ParticipantId";

/// Default visit column, always second in the default-visible list.
pub const VISIT_COLUMN: &str = "Visit";

/// Integer identifier of a dimension value (a type row id or location id).
pub type DimensionId = i64;

/// Ordered dimensions of one pivot key.
pub type DimensionList = SmallVec<[Dimension; MAX_ARITY]>;

// ============================================================================
// DIMENSIONS
// ============================================================================

/// One categorical axis a pivot key can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    PrimaryType,
    Derivative,
    Additive,
    Location,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::PrimaryType => "Primary Type",
            Dimension::Derivative => "Derivative Type",
            Dimension::Additive => "Additive Type",
            Dimension::Location => "Location",
        }
    }

    /// The catalog a column built on this dimension looks its values up in.
    pub fn lookup_target(self) -> LookupTarget {
        match self {
            Dimension::Location => LookupTarget::LocationCatalog,
            other => LookupTarget::TypeCatalog(other),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a materialized column's dimension label came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookupTarget {
    TypeCatalog(Dimension),
    LocationCatalog,
}

// ============================================================================
// AGGREGATE TAG
// ============================================================================

/// Name of the aggregate function that produced a pivot column ("Count",
/// "Sum", ...). The tag is opaque: functions are defined upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateTag(String);

impl AggregateTag {
    pub fn new(tag: impl Into<String>) -> Self {
        AggregateTag(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AggregateTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// PIVOT DEFINITION
// ============================================================================

/// Describes one pivot variant: its ordered dimension bindings and the fixed
/// columns that lead the default-visible list. Only `new` and the standard
/// constructors build one, so the dimension list is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotDefinition {
    /// Name of the materialized table (e.g. "SpecimenPivotByPrimaryType").
    pub name: String,

    /// Key segment `i` is an identifier of `dimensions[i]`.
    dimensions: DimensionList,

    /// Columns placed ahead of the pivot columns in the default-visible list.
    pub leading_columns: Vec<String>,
}

impl PivotDefinition {
    /// Creates a definition. Fails unless 1..=3 distinct dimensions are given.
    pub fn new(name: impl Into<String>, dimensions: &[Dimension]) -> Result<Self, PivotError> {
        let name = name.into();
        if dimensions.is_empty() || dimensions.len() > MAX_ARITY {
            return Err(PivotError::InvalidDefinition {
                name,
                reason: format!("expected 1 to {} dimensions, got {}", MAX_ARITY, dimensions.len()),
            });
        }
        for (i, dim) in dimensions.iter().enumerate() {
            if dimensions[..i].contains(dim) {
                return Err(PivotError::InvalidDefinition {
                    name,
                    reason: format!("dimension {} bound more than once", dim),
                });
            }
        }

        Ok(PivotDefinition {
            name,
            dimensions: dimensions.iter().copied().collect(),
            leading_columns: vec![SUBJECT_COLUMN.to_string(), VISIT_COLUMN.to_string()],
        })
    }

    /// Replaces the subject and visit column names.
    pub fn with_leading_columns(mut self, subject: impl Into<String>, visit: impl Into<String>) -> Self {
        self.leading_columns = vec![subject.into(), visit.into()];
        self
    }

    /// Pivot keyed by primary type alone: `<primary>::<agg>`.
    pub fn by_primary_type() -> Self {
        Self::standard("SpecimenPivotByPrimaryType", &[Dimension::PrimaryType])
    }

    /// Pivot keyed by primary and derivative type: `<primary>-<derivative>::<agg>`.
    pub fn by_derivative_type() -> Self {
        Self::standard(
            "SpecimenPivotByDerivativeType",
            &[Dimension::PrimaryType, Dimension::Derivative],
        )
    }

    /// Pivot keyed by primary type, derivative type and requesting location.
    pub fn by_requesting_location() -> Self {
        Self::standard(
            "SpecimenPivotByRequestingLocation",
            &[Dimension::PrimaryType, Dimension::Derivative, Dimension::Location],
        )
    }

    fn standard(name: &str, dimensions: &[Dimension]) -> Self {
        PivotDefinition {
            name: name.to_string(),
            dimensions: dimensions.iter().copied().collect(),
            leading_columns: vec![SUBJECT_COLUMN.to_string(), VISIT_COLUMN.to_string()],
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of identifier segments expected in each pivot key.
    pub fn arity(&self) -> usize {
        self.dimensions.len()
    }

    /// The dimension whose observed set drives default visibility.
    pub fn leading_dimension(&self) -> Dimension {
        // Construction guarantees at least one dimension.
        self.dimensions[0]
    }
}
