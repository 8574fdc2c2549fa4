//! FILENAME: pivot-engine/src/error.rs

use container_scope::ContainerId;
use thiserror::Error;

use crate::definition::Dimension;

/// Failure reported by a summary provider while fetching catalog data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        ProviderError {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error("Catalog retrieval failed for {dimension} in container {container}: {source}")]
    CatalogRetrieval {
        container: ContainerId,
        dimension: Dimension,
        #[source]
        source: ProviderError,
    },

    #[error("Invalid pivot definition '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("No {dimension} catalog available for pivot '{pivot}'")]
    MissingCatalog { pivot: String, dimension: Dimension },

    #[error("Catalogs span more than one container: {first} and {second}")]
    MixedContainers { first: ContainerId, second: ContainerId },
}
