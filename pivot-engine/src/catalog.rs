//! FILENAME: pivot-engine/src/catalog.rs
//! Type Catalogs - identifier to label maps for each pivot dimension.
//!
//! Catalogs are built fresh for one container from the external summary
//! provider and never change afterwards. Besides labels, a catalog records
//! which identifiers were actually observed (non-zero vial count) in the
//! container; the materializer uses that set for default visibility.

use container_scope::ContainerId;
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::{Dimension, DimensionId, MAX_ARITY};
use crate::error::{PivotError, ProviderError};

/// Label used for a catalogued identifier whose label is null.
pub const UNKNOWN_LABEL: &str = "[unknown]";

// ============================================================================
// PROVIDER INTERFACE
// ============================================================================

/// One row of a per-dimension type summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeEntry {
    pub id: Option<DimensionId>,
    pub label: Option<String>,
    /// Number of vials of this type in the container.
    #[serde(default)]
    pub count: u64,
}

impl TypeEntry {
    pub fn new(id: DimensionId, label: impl Into<String>, count: u64) -> Self {
        TypeEntry {
            id: Some(id),
            label: Some(label.into()),
            count,
        }
    }
}

/// A site/location known to the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: Option<DimensionId>,
    pub label: String,
}

impl LocationRecord {
    pub fn new(id: DimensionId, label: impl Into<String>) -> Self {
        LocationRecord {
            id: Some(id),
            label: label.into(),
        }
    }
}

/// Source of the per-container type summary. Implementations typically run
/// a query; any failure must be reported rather than returning an empty list.
pub trait SummaryProvider {
    fn primary_types(&self, container: &ContainerId) -> Result<Vec<TypeEntry>, ProviderError>;
    fn derivatives(&self, container: &ContainerId) -> Result<Vec<TypeEntry>, ProviderError>;
    fn additives(&self, container: &ContainerId) -> Result<Vec<TypeEntry>, ProviderError>;
    fn locations(&self, container: &ContainerId) -> Result<Vec<LocationRecord>, ProviderError>;
}

// ============================================================================
// TYPE CATALOG
// ============================================================================

/// Immutable identifier -> label map for one dimension in one container.
#[derive(Debug, Clone)]
pub struct TypeCatalog {
    container: ContainerId,
    dimension: Dimension,
    labels: FxHashMap<DimensionId, String>,
    /// Identifiers in the order the provider first reported them.
    order: Vec<DimensionId>,
    observed: FxHashSet<DimensionId>,
}

impl TypeCatalog {
    fn empty(container: ContainerId, dimension: Dimension) -> Self {
        TypeCatalog {
            container,
            dimension,
            labels: FxHashMap::default(),
            order: Vec::new(),
            observed: FxHashSet::default(),
        }
    }

    /// Builds a catalog from type summary rows. Rows with a null id are
    /// skipped; repeated ids keep their first label and sum their counts.
    pub fn from_type_entries<I>(container: ContainerId, dimension: Dimension, entries: I) -> Self
    where
        I: IntoIterator<Item = TypeEntry>,
    {
        let mut catalog = TypeCatalog::empty(container, dimension);
        let mut counts: FxHashMap<DimensionId, u64> = FxHashMap::default();

        for entry in entries {
            let Some(id) = entry.id else {
                continue;
            };
            let label = entry.label.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
            catalog.insert(id, label);
            *counts.entry(id).or_insert(0) += entry.count;
        }

        catalog.observed = counts
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(id, _)| id)
            .collect();
        catalog
    }

    /// Builds the location catalog. Locations carry no counts, so every
    /// catalogued location counts as observed.
    pub fn from_locations<I>(container: ContainerId, records: I) -> Self
    where
        I: IntoIterator<Item = LocationRecord>,
    {
        let mut catalog = TypeCatalog::empty(container, Dimension::Location);
        for record in records {
            if let Some(id) = record.id {
                catalog.insert(id, record.label);
            }
        }
        catalog.observed = catalog.order.iter().copied().collect();
        catalog
    }

    fn insert(&mut self, id: DimensionId, label: String) {
        if !self.labels.contains_key(&id) {
            self.labels.insert(id, label);
            self.order.push(id);
        }
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn label(&self, id: DimensionId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    pub fn contains(&self, id: DimensionId) -> bool {
        self.labels.contains_key(&id)
    }

    /// Whether the identifier had a non-zero count in this container.
    pub fn is_observed(&self, id: DimensionId) -> bool {
        self.observed.contains(&id)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entries in provider order.
    pub fn iter(&self) -> impl Iterator<Item = (DimensionId, &str)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.labels.get(id).map(|label| (*id, label.as_str())))
    }
}

/// Fetches one dimension's summary for a container and builds its catalog.
pub fn resolve_catalog<P>(
    provider: &P,
    container: &ContainerId,
    dimension: Dimension,
) -> Result<TypeCatalog, PivotError>
where
    P: SummaryProvider + ?Sized,
{
    let retrieval_failed = |source: ProviderError| PivotError::CatalogRetrieval {
        container: container.clone(),
        dimension,
        source,
    };

    let catalog = match dimension {
        Dimension::PrimaryType => TypeCatalog::from_type_entries(
            container.clone(),
            dimension,
            provider.primary_types(container).map_err(retrieval_failed)?,
        ),
        Dimension::Derivative => TypeCatalog::from_type_entries(
            container.clone(),
            dimension,
            provider.derivatives(container).map_err(retrieval_failed)?,
        ),
        Dimension::Additive => TypeCatalog::from_type_entries(
            container.clone(),
            dimension,
            provider.additives(container).map_err(retrieval_failed)?,
        ),
        Dimension::Location => TypeCatalog::from_locations(
            container.clone(),
            provider.locations(container).map_err(retrieval_failed)?,
        ),
    };

    debug!(
        "catalog: {} in {} -> {} entries, {} observed",
        dimension,
        container,
        catalog.len(),
        catalog.observed_count()
    );
    Ok(catalog)
}

// ============================================================================
// CATALOG SET
// ============================================================================

/// The catalogs one materialization needs, all from the same container.
#[derive(Debug, Clone)]
pub struct CatalogSet {
    container: ContainerId,
    catalogs: SmallVec<[TypeCatalog; MAX_ARITY]>,
}

impl CatalogSet {
    /// Resolves a catalog for each distinct dimension, stopping at the first
    /// provider failure.
    pub fn resolve<P>(
        provider: &P,
        container: &ContainerId,
        dimensions: &[Dimension],
    ) -> Result<Self, PivotError>
    where
        P: SummaryProvider + ?Sized,
    {
        let mut set = CatalogSet {
            container: container.clone(),
            catalogs: SmallVec::new(),
        };
        for &dimension in dimensions {
            if set.get(dimension).is_none() {
                set.catalogs.push(resolve_catalog(provider, container, dimension)?);
            }
        }
        Ok(set)
    }

    /// Wraps catalogs the caller already holds. All must belong to
    /// `container`; a later catalog for the same dimension replaces an
    /// earlier one.
    pub fn from_catalogs<I>(container: ContainerId, catalogs: I) -> Result<Self, PivotError>
    where
        I: IntoIterator<Item = TypeCatalog>,
    {
        let mut set = CatalogSet {
            container,
            catalogs: SmallVec::new(),
        };
        for catalog in catalogs {
            if catalog.container != set.container {
                return Err(PivotError::MixedContainers {
                    first: set.container.clone(),
                    second: catalog.container.clone(),
                });
            }
            set.catalogs.retain(|existing| existing.dimension != catalog.dimension);
            set.catalogs.push(catalog);
        }
        Ok(set)
    }

    pub fn container(&self) -> &ContainerId {
        &self.container
    }

    pub fn get(&self, dimension: Dimension) -> Option<&TypeCatalog> {
        self.catalogs.iter().find(|catalog| catalog.dimension == dimension)
    }
}
