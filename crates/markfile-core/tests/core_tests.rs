use markfile_core::metadata::{format_size_signed, format_timestamp};
use markfile_core::{
    normalize_path, ConflictPolicy, EntryKind, ErrorCategory, MetadataReport, OpsConfig, OpsError,
};
use std::fs;
use std::path::PathBuf;

#[test]
fn test_metadata_report_for_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("report.txt");
    fs::write(&path, vec![b'x'; 1500]).unwrap();

    let report = MetadataReport::read(&path).unwrap();

    assert_eq!(report.kind, EntryKind::File);
    assert_eq!(report.size, 1500);
    assert_eq!(report.size_display(), "1.5 kB");
    assert_eq!(report.permissions_symbolic().len(), 9);
    assert!(report.timestamps.modified.is_some());
    assert_eq!(report.summary_lines().len(), 7);
}

#[cfg(unix)]
#[test]
fn test_metadata_report_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("script.sh");
    fs::write(&path, "#!/bin/sh\n").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o754)).unwrap();

    let report = MetadataReport::read(&path).unwrap();
    assert_eq!(report.permissions_octal(), "754");
    assert_eq!(report.permissions_symbolic(), "rwxr-xr--");
}

#[test]
fn test_metadata_report_for_directory() {
    let temp = tempfile::tempdir().unwrap();
    let report = MetadataReport::read(temp.path()).unwrap();
    assert_eq!(report.kind, EntryKind::Directory);
}

#[test]
fn test_metadata_for_vanished_path() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("gone");

    let err = MetadataReport::read(&path).unwrap_err();
    assert!(matches!(err, OpsError::MetadataUnavailable { .. }));
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(err.path(), Some(path.as_path()));
}

#[test]
fn test_signed_sizes_are_symmetric() {
    assert_eq!(format_size_signed(1500), "1.5 kB");
    assert_eq!(format_size_signed(-1500), "-1.5 kB");
    assert_eq!(format_timestamp(None), "-");
}

#[test]
fn test_normalize_path() {
    assert_eq!(
        normalize_path("/tmp/./a/").unwrap(),
        PathBuf::from("/tmp/a")
    );
    assert!(matches!(
        normalize_path("tmp/a"),
        Err(OpsError::NotAbsolute { .. })
    ));
}

#[test]
fn test_config_from_toml_defaults() {
    let config: OpsConfig = toml::from_str("conflict_policy = \"overwrite\"").unwrap();
    assert_eq!(config.conflict_policy, ConflictPolicy::Overwrite);
    assert!(config.delete_continue_default);
    assert!(config.batch_continue_default);
    assert!(!config.rename_continue_default);
    assert_eq!(config.comment_marker, "#");
}
