//! FILENAME: pivot-engine/src/decoder.rs
//! PURPOSE: Decodes encoded pivot column names into resolved keys.
//! CONTEXT: The aggregation step names each pivot column
//! `<id>-<id>[-<id>]::<aggregate>`. Decoding runs in four stages and any
//! stage can turn the name away; none of them panic.
//!
//! STAGES:
//!   1. split on "::"      -> not exactly (key, tag): not a pivot column
//!   2. split key on "-"   -> segment count != arity: rejected
//!   3. parse segments     -> any non-integer segment: rejected
//!   4. catalog lookup     -> any unknown identifier: rejected

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::{CatalogSet, TypeCatalog};
use crate::definition::{
    AggregateTag, Dimension, DimensionId, PivotDefinition, AGG_DELIM, MAX_ARITY, TYPE_DELIM,
};
use crate::error::PivotError;

// ============================================================================
// DECODED FORMS
// ============================================================================

/// A raw name split into its key segment and aggregate tag (stage 1 only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedColumnName<'a> {
    pub key: &'a str,
    pub aggregate: &'a str,
}

/// Splits a raw column name on `AGG_DELIM`. Trailing empty parts are
/// ignored, so `1-5::Count::` reads as `1-5::Count` and `1-5::` has no tag.
/// `None` means the column is not a pivot column and passes through
/// untouched.
pub fn split_encoded(raw: &str) -> Option<EncodedColumnName<'_>> {
    let mut parts: SmallVec<[&str; 4]> = raw.split(AGG_DELIM).collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    match parts.as_slice() {
        &[key, aggregate] => Some(EncodedColumnName { key, aggregate }),
        _ => None,
    }
}

/// One resolved key segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySegment {
    pub dimension: Dimension,
    pub id: DimensionId,
    pub label: String,
}

/// A pivot key whose every identifier resolved in its catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedPivotKey {
    pub segments: SmallVec<[KeySegment; MAX_ARITY]>,
    pub aggregate: AggregateTag,
}

impl DecodedPivotKey {
    /// The segment that decides default visibility.
    pub fn leading(&self) -> &KeySegment {
        // Decoding only succeeds with arity >= 1.
        &self.segments[0]
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|segment| segment.label.as_str())
    }
}

/// Why a pivot-shaped name was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodeRejection {
    ArityMismatch { expected: usize, found: usize },
    NonNumericSegment { position: usize, segment: String },
    UnknownIdentifier { dimension: Dimension, id: DimensionId },
}

impl DecodeRejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            DecodeRejection::ArityMismatch { .. } => RejectionKind::ArityMismatch,
            DecodeRejection::NonNumericSegment { .. } => RejectionKind::NonNumericSegment,
            DecodeRejection::UnknownIdentifier { .. } => RejectionKind::UnknownIdentifier,
        }
    }
}

impl std::fmt::Display for DecodeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeRejection::ArityMismatch { expected, found } => {
                write!(f, "expected {} key segments, found {}", expected, found)
            }
            DecodeRejection::NonNumericSegment { position, segment } => {
                write!(f, "segment {} ('{}') is not an integer", position, segment)
            }
            DecodeRejection::UnknownIdentifier { dimension, id } => {
                write!(f, "{} {} is not in the catalog", dimension, id)
            }
        }
    }
}

/// Coarse rejection category, used for drop counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionKind {
    ArityMismatch,
    NonNumericSegment,
    UnknownIdentifier,
}

/// Result of decoding one raw column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// Not a pivot column (e.g. the subject or visit column).
    Passthrough,
    Decoded(DecodedPivotKey),
    Rejected(DecodeRejection),
}

// ============================================================================
// DECODER
// ============================================================================

/// Decodes raw names for one pivot definition against one set of catalogs.
#[derive(Debug, Clone)]
pub struct ColumnDecoder<'a> {
    dimensions: &'a [Dimension],
    /// `catalogs[i]` resolves key segment `i`.
    catalogs: SmallVec<[&'a TypeCatalog; MAX_ARITY]>,
}

impl<'a> ColumnDecoder<'a> {
    /// Binds each dimension of the definition to its catalog. Fails when a
    /// catalog is missing.
    pub fn new(definition: &'a PivotDefinition, catalogs: &'a CatalogSet) -> Result<Self, PivotError> {
        let bound = definition
            .dimensions()
            .iter()
            .map(|&dimension| {
                catalogs.get(dimension).ok_or_else(|| PivotError::MissingCatalog {
                    pivot: definition.name.clone(),
                    dimension,
                })
            })
            .collect::<Result<SmallVec<[&TypeCatalog; MAX_ARITY]>, PivotError>>()?;

        Ok(ColumnDecoder {
            dimensions: definition.dimensions(),
            catalogs: bound,
        })
    }

    pub fn arity(&self) -> usize {
        self.dimensions.len()
    }

    pub fn decode(&self, raw: &str) -> DecodeOutcome {
        let Some(encoded) = split_encoded(raw) else {
            return DecodeOutcome::Passthrough;
        };
        match self.decode_key(encoded) {
            Ok(key) => DecodeOutcome::Decoded(key),
            Err(rejection) => DecodeOutcome::Rejected(rejection),
        }
    }

    fn decode_key(&self, encoded: EncodedColumnName<'_>) -> Result<DecodedPivotKey, DecodeRejection> {
        let raw_segments: SmallVec<[&str; MAX_ARITY]> = encoded.key.split(TYPE_DELIM).collect();
        if raw_segments.len() != self.arity() {
            return Err(DecodeRejection::ArityMismatch {
                expected: self.arity(),
                found: raw_segments.len(),
            });
        }

        let ids = raw_segments
            .iter()
            .enumerate()
            .map(|(position, segment)| {
                segment
                    .parse::<DimensionId>()
                    .map_err(|_| DecodeRejection::NonNumericSegment {
                        position,
                        segment: (*segment).to_string(),
                    })
            })
            .collect::<Result<SmallVec<[DimensionId; MAX_ARITY]>, _>>()?;

        let segments = ids
            .iter()
            .zip(self.catalogs.iter().zip(self.dimensions))
            .map(|(&id, (catalog, &dimension))| {
                catalog
                    .label(id)
                    .map(|label| KeySegment {
                        dimension,
                        id,
                        label: label.to_string(),
                    })
                    .ok_or(DecodeRejection::UnknownIdentifier { dimension, id })
            })
            .collect::<Result<SmallVec<[KeySegment; MAX_ARITY]>, _>>()?;

        Ok(DecodedPivotKey {
            segments,
            aggregate: AggregateTag::new(encoded.aggregate),
        })
    }
}

/// Decodes a single raw name; a convenience over `ColumnDecoder`.
pub fn decode_column(
    raw: &str,
    definition: &PivotDefinition,
    catalogs: &CatalogSet,
) -> Result<DecodeOutcome, PivotError> {
    Ok(ColumnDecoder::new(definition, catalogs)?.decode(raw))
}
