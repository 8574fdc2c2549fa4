//! FILENAME: pivot-engine/src/engine.rs
//! Pivot Materializer - turns raw aggregate column names into table metadata.
//!
//! This module takes a PivotDefinition (what the keys mean), a CatalogSet
//! (what the identifiers are called in this container) and the raw column
//! names of the aggregate result, and produces a MaterializedTable.
//!
//! Algorithm:
//! 1. Decode every raw name; sort each into passthrough, decoded or dropped
//! 2. Label decoded keys: dimension labels joined by ":", then "_<aggregate>"
//! 3. Derive a unique identifier-safe name from each label
//! 4. Mark a column visible when its leading identifier was observed
//! 5. Emit the default-visible list: leading columns, then visible columns

use container_scope::ContainerId;
use log::{debug, info, warn};
use rustc_hash::FxHashSet;

use crate::catalog::{CatalogSet, SummaryProvider, TypeCatalog};
use crate::decoder::{ColumnDecoder, DecodeOutcome, DecodedPivotKey};
use crate::definition::{AggregateTag, PivotDefinition};
use crate::error::PivotError;
use crate::view::{ColumnVisibility, DropReport, MaterializedColumn, MaterializedTable};

// ============================================================================
// LABELS AND NAMES
// ============================================================================

/// Joins dimension labels with ":" and appends "_" plus the aggregate tag.
pub fn compose_label<'s, I>(labels: I, aggregate: &AggregateTag) -> String
where
    I: IntoIterator<Item = &'s str>,
{
    let mut label = labels.into_iter().collect::<Vec<_>>().join(":");
    label.push('_');
    label.push_str(aggregate.as_str());
    label
}

/// Maps a label to an identifier-safe name. The ":" between dimension
/// labels becomes "_"; leading characters that cannot start an identifier
/// are skipped and any other character that is not a letter, digit or "_"
/// is dropped. Letters outside ASCII are kept. When nothing can start an
/// identifier (an all-digit label, say) the name is prefixed with "column".
pub fn legal_name(label: &str) -> String {
    let chars: Vec<char> = label
        .chars()
        .map(|c| if c == ':' { '_' } else { c })
        .collect();

    let mut name = String::with_capacity(label.len() + 6);
    let start = match chars.iter().position(|&c| is_identifier_start(c)) {
        Some(start) => start,
        None => {
            name.push_str("column");
            0
        }
    };
    name.extend(chars[start..].iter().copied().filter(|&c| is_identifier_part(c)));
    name
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tracks names already taken in one table and hands out unique ones.
struct NameRegistry {
    taken: FxHashSet<String>,
}

impl NameRegistry {
    fn new() -> Self {
        NameRegistry {
            taken: FxHashSet::default(),
        }
    }

    fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    /// Returns `base`, or `base_2`, `base_3`, ... when `base` is taken.
    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{}_{}", base, n);
            if self.taken.insert(candidate.clone()) {
                warn!("pivot: column name '{}' already used, renamed to '{}'", base, candidate);
                return candidate;
            }
            n += 1;
        }
    }
}

// ============================================================================
// MATERIALIZER
// ============================================================================

/// Materializes pivot columns for one definition and one container.
pub struct PivotMaterializer<'a> {
    definition: &'a PivotDefinition,
    container: &'a ContainerId,
    decoder: ColumnDecoder<'a>,
    leading_catalog: &'a TypeCatalog,
}

impl<'a> PivotMaterializer<'a> {
    pub fn new(definition: &'a PivotDefinition, catalogs: &'a CatalogSet) -> Result<Self, PivotError> {
        let decoder = ColumnDecoder::new(definition, catalogs)?;
        let leading_dimension = definition.leading_dimension();
        let leading_catalog = catalogs
            .get(leading_dimension)
            .ok_or_else(|| PivotError::MissingCatalog {
                pivot: definition.name.clone(),
                dimension: leading_dimension,
            })?;

        Ok(PivotMaterializer {
            definition,
            container: catalogs.container(),
            decoder,
            leading_catalog,
        })
    }

    /// Visible iff the key's leading identifier was observed in the container.
    pub fn visibility(&self, key: &DecodedPivotKey) -> ColumnVisibility {
        if self.leading_catalog.is_observed(key.leading().id) {
            ColumnVisibility::Visible
        } else {
            ColumnVisibility::Hidden
        }
    }

    /// Builds the column for one decoded key under the given name.
    fn build_column(&self, raw: &str, key: DecodedPivotKey, name: String, label: String) -> MaterializedColumn {
        MaterializedColumn {
            name,
            label,
            source_column: raw.to_string(),
            lookups: key
                .segments
                .iter()
                .map(|segment| segment.dimension.lookup_target())
                .collect(),
            visibility: self.visibility(&key),
            key,
        }
    }

    /// Decodes and labels a single raw name; `None` for passthrough and
    /// rejected names. The name is the plain `legal_name` of the label: no
    /// collision handling is done, so it may differ from the name
    /// `materialize` gives the same raw column and may equal a leading or
    /// passthrough column name. Label and visibility always match.
    pub fn materialize_column(&self, raw: &str) -> Option<MaterializedColumn> {
        match self.decoder.decode(raw) {
            DecodeOutcome::Decoded(key) => {
                let label = compose_label(key.labels(), &key.aggregate);
                let name = legal_name(&label);
                Some(self.build_column(raw, key, name, label))
            }
            DecodeOutcome::Passthrough | DecodeOutcome::Rejected(_) => None,
        }
    }

    pub fn materialize<S>(&self, raw_columns: &[S]) -> MaterializedTable
    where
        S: AsRef<str>,
    {
        let outcomes: Vec<(&str, DecodeOutcome)> = raw_columns
            .iter()
            .map(|raw| {
                let raw = raw.as_ref();
                (raw, self.decoder.decode(raw))
            })
            .collect();

        let mut names = NameRegistry::new();
        for leading in &self.definition.leading_columns {
            names.reserve(leading);
        }
        for (raw, outcome) in &outcomes {
            if matches!(outcome, DecodeOutcome::Passthrough) {
                names.reserve(raw);
            }
        }

        let mut columns = Vec::new();
        let mut passthrough_columns = Vec::new();
        let mut dropped = DropReport::default();

        for (raw, outcome) in outcomes {
            match outcome {
                DecodeOutcome::Passthrough => passthrough_columns.push(raw.to_string()),
                DecodeOutcome::Rejected(rejection) => {
                    debug!("pivot {}: dropping column '{}': {}", self.definition.name, raw, rejection);
                    dropped.record(raw, &rejection);
                }
                DecodeOutcome::Decoded(key) => {
                    let label = compose_label(key.labels(), &key.aggregate);
                    let name = names.claim(legal_name(&label));
                    columns.push(self.build_column(raw, key, name, label));
                }
            }
        }

        let default_visible_columns = self
            .definition
            .leading_columns
            .iter()
            .cloned()
            .chain(
                columns
                    .iter()
                    .filter(|column| column.is_visible())
                    .map(|column| column.name.clone()),
            )
            .collect::<Vec<_>>();

        info!(
            "pivot {}: {} column(s) in {} ({} visible), {} passthrough, {} dropped",
            self.definition.name,
            columns.len(),
            self.container,
            default_visible_columns.len() - self.definition.leading_columns.len(),
            passthrough_columns.len(),
            dropped.total
        );

        MaterializedTable {
            pivot: self.definition.name.clone(),
            container: self.container.clone(),
            columns,
            passthrough_columns,
            default_visible_columns,
            dropped,
        }
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Materializes raw columns against catalogs the caller already built.
pub fn materialize_pivot<S>(
    definition: &PivotDefinition,
    catalogs: &CatalogSet,
    raw_columns: &[S],
) -> Result<MaterializedTable, PivotError>
where
    S: AsRef<str>,
{
    Ok(PivotMaterializer::new(definition, catalogs)?.materialize(raw_columns))
}

/// Full flow for one request: resolve the container's catalogs, then
/// materialize. Provider failures abort with `CatalogRetrieval`.
pub fn build_pivot_table<P, S>(
    provider: &P,
    container: &ContainerId,
    definition: &PivotDefinition,
    raw_columns: &[S],
) -> Result<MaterializedTable, PivotError>
where
    P: SummaryProvider + ?Sized,
    S: AsRef<str>,
{
    let catalogs = CatalogSet::resolve(provider, container, definition.dimensions())?;
    materialize_pivot(definition, &catalogs, raw_columns)
}
