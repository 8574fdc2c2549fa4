//! FILENAME: pivot-config/src/tests.rs
//! PURPOSE: Unit tests for loading and validating pivot settings.

use std::io::Write;

use container_scope::{ContainerId, PermissionClass, ScopeRequest};
use pivot_engine::Dimension;

use crate::{DefaultScopeMode, PivotSettings, SettingsError, MAX_SETTINGS_FILE_SIZE};

fn write_settings(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_defaults_have_standard_pivots() {
    let settings = PivotSettings::default();
    let names: Vec<String> = settings.definitions().unwrap().into_iter().map(|d| d.name).collect();

    assert_eq!(
        names,
        vec![
            "SpecimenPivotByPrimaryType",
            "SpecimenPivotByDerivativeType",
            "SpecimenPivotByRequestingLocation",
        ]
    );
    assert!(settings.validate().is_ok());
}

#[test]
fn test_empty_object_uses_defaults() {
    let settings = PivotSettings::from_json_str("{}").unwrap();
    assert_eq!(settings, PivotSettings::default());
}

#[test]
fn test_load_from_file() {
    let file = write_settings(
        r#"{
            "subject_column": "SubjectId",
            "visit_column": "SequenceNum",
            "pivots": [
                { "name": "ByAdditive", "dimensions": ["PrimaryType", "Additive"] }
            ],
            "scope": { "permission": "Update", "default_mode": "CurrentAndSubfolders" }
        }"#,
    );

    let settings = PivotSettings::load(file.path()).unwrap();
    let definition = settings.definition("ByAdditive").unwrap();

    assert_eq!(definition.dimensions(), &[Dimension::PrimaryType, Dimension::Additive]);
    assert_eq!(definition.leading_columns, vec!["SubjectId", "SequenceNum"]);
    assert_eq!(settings.scope.permission, PermissionClass::Update);
    assert_eq!(settings.scope.default_mode, DefaultScopeMode::CurrentAndSubfolders);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = PivotSettings::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, SettingsError::Io(_)));
}

#[test]
fn test_oversized_file_is_refused() {
    let padding = " ".repeat(MAX_SETTINGS_FILE_SIZE as usize + 1);
    let file = write_settings(&format!("{{}}{}", padding));

    let err = PivotSettings::load(file.path()).unwrap_err();
    assert!(matches!(err, SettingsError::TooLarge { .. }));
}

#[test]
fn test_oversized_file_reports_bytes_read() {
    let limit = MAX_SETTINGS_FILE_SIZE as usize;
    let file = write_settings(&format!("{{}}{}", " ".repeat(limit)));

    match PivotSettings::load(file.path()).unwrap_err() {
        SettingsError::TooLarge { size, limit: reported } => {
            assert_eq!(size, limit as u64 + 2);
            assert_eq!(reported, MAX_SETTINGS_FILE_SIZE);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_non_utf8_file_is_invalid() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[b'{', 0xff, b'}']).unwrap();

    let err = PivotSettings::load(file.path()).unwrap_err();
    assert!(matches!(err, SettingsError::Invalid(_)));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = PivotSettings::from_json_str("{ \"pivots\": 3 }").unwrap_err();
    assert!(matches!(err, SettingsError::Parse(_)));
}

#[test]
fn test_invalid_pivot_definitions() {
    let too_wide = r#"{ "pivots": [ { "name": "Wide",
        "dimensions": ["PrimaryType", "Derivative", "Additive", "Location"] } ] }"#;
    assert!(matches!(
        PivotSettings::from_json_str(too_wide).unwrap_err(),
        SettingsError::Pivot(_)
    ));

    let duplicate = r#"{ "pivots": [
        { "name": "P", "dimensions": ["PrimaryType"] },
        { "name": "P", "dimensions": ["Derivative"] } ] }"#;
    assert!(matches!(
        PivotSettings::from_json_str(duplicate).unwrap_err(),
        SettingsError::Invalid(_)
    ));

    let same_columns = r#"{ "subject_column": "Visit", "visit_column": "Visit" }"#;
    assert!(matches!(
        PivotSettings::from_json_str(same_columns).unwrap_err(),
        SettingsError::Invalid(_)
    ));
}

#[test]
fn test_unknown_pivot() {
    let settings = PivotSettings::default();
    assert!(matches!(
        settings.definition("Nope").unwrap_err(),
        SettingsError::UnknownPivot(name) if name == "Nope"
    ));
}

#[test]
fn test_scope_request_selection() {
    let settings = PivotSettings::default();
    let explicit = vec![ContainerId::new("A")];

    assert_eq!(
        settings.scope.request(Some(explicit.clone())),
        ScopeRequest::ExplicitList(explicit)
    );
    assert_eq!(settings.scope.request(None), ScopeRequest::AllInProject);

    let subfolders = crate::ScopeSettings {
        default_mode: DefaultScopeMode::CurrentAndSubfolders,
        ..settings.scope
    };
    assert_eq!(subfolders.request(None), ScopeRequest::CurrentAndSubfolders);
}
