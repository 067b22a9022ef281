//! Reading hostname lists from files.

use std::io::Write;

use cert_census::hostnames::load_hostnames;

#[tokio::test]
async fn test_load_hostnames_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "# exported bookmarks").unwrap();
    writeln!(file, "a.example").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "https://b.example/login").unwrap();
    writeln!(file, "a.example").unwrap();
    writeln!(file, "  c.example  ").unwrap();
    file.flush().unwrap();

    let list = load_hostnames(file.path()).await.unwrap();

    assert_eq!(
        list.hostnames,
        vec!["a.example", "b.example", "a.example", "c.example"]
    );
    assert_eq!(list.counts[0], ("a.example".to_string(), 2));
    assert_eq!(list.counts.len(), 3);
}

#[tokio::test]
async fn test_empty_file_gives_empty_list() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let list = load_hostnames(file.path()).await.unwrap();
    assert!(list.is_empty());
    assert!(list.counts.is_empty());
}

#[tokio::test]
async fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_hostnames(&dir.path().join("missing.txt"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Failed to open hostname file"));
}
