use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("healthcheck"));
    cmd.args(["--db-path", "some_db"])
        .args(["create-intent", "--user", "user1", "--amount", "100"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_no_fallback_warning() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut cmd = Command::new(cargo_bin!("healthcheck"));
    cmd.arg("--db-path")
        .arg(&db_path)
        .args(["create-intent", "--user", "user1", "--amount", "100"]);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("WARNING").not());
}
