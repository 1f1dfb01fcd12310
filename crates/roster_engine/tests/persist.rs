use std::fs;

use roster_engine::{ensure_report_dir, PersistError, ReportWriter};

#[test]
fn writer_creates_dir_and_replaces_report() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("reports");
    let writer = ReportWriter::new(&dir);

    let path = writer.write("last.ron", "first").expect("first write");
    assert_eq!(fs::read_to_string(&path).unwrap(), "first");

    let path = writer.write("last.ron", "second").expect("second write");
    assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
}

#[test]
fn report_dir_that_is_a_file_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("not_a_dir");
    fs::write(&file, "x").unwrap();

    let err = ensure_report_dir(&file).unwrap_err();
    assert!(matches!(err, PersistError::ReportDir(_)));
}
