//! FILENAME: pivot-config/src/lib.rs
//! Pivot Settings
//!
//! Reads the JSON settings that tell the pivot engine which pivot variants
//! exist, what the subject and visit columns are called, and how container
//! scope is computed when the caller gives no explicit list.
//!
//! Example:
//! ```json
//! {
//!   "subject_column": "ParticipantId",
//!   "visit_column": "Visit",
//!   "pivots": [
//!     { "name": "SpecimenPivotByDerivativeType", "dimensions": ["PrimaryType", "Derivative"] }
//!   ],
//!   "scope": { "permission": "Read", "default_mode": "AllInProject" }
//! }
//! ```

mod error;

#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use container_scope::{ContainerId, PermissionClass, ScopeRequest};
use log::info;
use pivot_engine::{Dimension, PivotDefinition, SUBJECT_COLUMN, VISIT_COLUMN};
use serde::{Deserialize, Serialize};

pub use error::SettingsError;

/// Settings files larger than this are refused.
pub const MAX_SETTINGS_FILE_SIZE: u64 = 256 * 1024;

// ============================================================================
// PIVOTS
// ============================================================================

/// One configured pivot variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub name: String,
    /// Key segment order of the encoded column names.
    pub dimensions: Vec<Dimension>,
}

impl PivotSpec {
    pub fn new(name: impl Into<String>, dimensions: &[Dimension]) -> Self {
        PivotSpec {
            name: name.into(),
            dimensions: dimensions.to_vec(),
        }
    }
}

fn default_pivots() -> Vec<PivotSpec> {
    [
        PivotDefinition::by_primary_type(),
        PivotDefinition::by_derivative_type(),
        PivotDefinition::by_requesting_location(),
    ]
    .iter()
    .map(|definition| PivotSpec::new(definition.name.clone(), definition.dimensions()))
    .collect()
}

fn default_subject_column() -> String {
    SUBJECT_COLUMN.to_string()
}

fn default_visit_column() -> String {
    VISIT_COLUMN.to_string()
}

// ============================================================================
// SCOPE
// ============================================================================

/// Enumeration used when a request names no containers explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DefaultScopeMode {
    #[default]
    AllInProject,
    CurrentAndSubfolders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScopeSettings {
    #[serde(default)]
    pub permission: PermissionClass,
    #[serde(default)]
    pub default_mode: DefaultScopeMode,
}

impl ScopeSettings {
    /// The explicit list when given, otherwise the configured enumeration.
    pub fn request(&self, explicit: Option<Vec<ContainerId>>) -> ScopeRequest {
        match (explicit, self.default_mode) {
            (Some(ids), _) => ScopeRequest::ExplicitList(ids),
            (None, DefaultScopeMode::AllInProject) => ScopeRequest::AllInProject,
            (None, DefaultScopeMode::CurrentAndSubfolders) => ScopeRequest::CurrentAndSubfolders,
        }
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSettings {
    #[serde(default = "default_subject_column")]
    pub subject_column: String,
    #[serde(default = "default_visit_column")]
    pub visit_column: String,
    #[serde(default = "default_pivots")]
    pub pivots: Vec<PivotSpec>,
    #[serde(default)]
    pub scope: ScopeSettings,
}

impl Default for PivotSettings {
    fn default() -> Self {
        PivotSettings {
            subject_column: default_subject_column(),
            visit_column: default_visit_column(),
            pivots: default_pivots(),
            scope: ScopeSettings::default(),
        }
    }
}

impl PivotSettings {
    /// Reads, parses and validates a settings file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let bytes = fs::read(path)?;
        let size = bytes.len() as u64;
        if size > MAX_SETTINGS_FILE_SIZE {
            return Err(SettingsError::TooLarge {
                size,
                limit: MAX_SETTINGS_FILE_SIZE,
            });
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| SettingsError::Invalid("settings file must be utf-8".to_string()))?;
        let settings = Self::from_json_str(content)?;
        info!(
            "settings: loaded {} pivot(s) from {}",
            settings.pivots.len(),
            path.display()
        );
        Ok(settings)
    }

    /// Parses and validates settings from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.subject_column.trim().is_empty() || self.visit_column.trim().is_empty() {
            return Err(SettingsError::Invalid(
                "subject_column and visit_column must be set".to_string(),
            ));
        }
        if self.subject_column == self.visit_column {
            return Err(SettingsError::Invalid(
                "subject_column and visit_column must differ".to_string(),
            ));
        }
        for (i, pivot) in self.pivots.iter().enumerate() {
            if pivot.name.trim().is_empty() {
                return Err(SettingsError::Invalid(format!("pivots[{}].name must be set", i)));
            }
            if self.pivots[..i].iter().any(|other| other.name == pivot.name) {
                return Err(SettingsError::Invalid(format!(
                    "pivot '{}' is configured more than once",
                    pivot.name
                )));
            }
            self.build(pivot)?;
        }
        Ok(())
    }

    fn build(&self, pivot: &PivotSpec) -> Result<PivotDefinition, SettingsError> {
        Ok(PivotDefinition::new(pivot.name.clone(), &pivot.dimensions)?
            .with_leading_columns(self.subject_column.clone(), self.visit_column.clone()))
    }

    /// Every configured pivot as a definition, in file order.
    pub fn definitions(&self) -> Result<Vec<PivotDefinition>, SettingsError> {
        self.pivots.iter().map(|pivot| self.build(pivot)).collect()
    }

    pub fn definition(&self, name: &str) -> Result<PivotDefinition, SettingsError> {
        let pivot = self
            .pivots
            .iter()
            .find(|pivot| pivot.name == name)
            .ok_or_else(|| SettingsError::UnknownPivot(name.to_string()))?;
        self.build(pivot)
    }
}
