use tempfile::tempdir;

use super::*;

#[test]
fn pmid_files_skip_blanks_and_comments() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("positives.txt");
    std::fs::write(&path, "# topic seed\n11809184\n\n  12925793 \n# trailing\n10865959\n")
        .unwrap();

    let ids = read_pmid_file(&path).unwrap();
    assert_eq!(ids, vec![11809184, 12925793, 10865959]);
}

#[test]
fn bad_pmid_lines_are_reported_with_their_location() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("positives.txt");
    std::fs::write(&path, "123\nnot-a-pmid\n").unwrap();

    let err = read_pmid_file(&path).unwrap_err();
    assert!(format!("{err:#}").contains(":2"));
}

#[test]
fn missing_pmid_files_error_out() {
    let dir = tempdir().unwrap();
    assert!(read_pmid_file(&dir.path().join("absent.txt")).is_err());
}
