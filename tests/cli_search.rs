mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use common::{MockElastic, INDEX};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

/// A `dualsearch` command isolated from any ambient config or env.
fn isolated_cmd(dir: &std::path::Path) -> Command {
    let mut cmd = cargo_bin_cmd!("dualsearch");
    cmd.current_dir(dir)
        .env_remove("DUALSEARCH_PG_URL")
        .env_remove("DUALSEARCH_ES_HOST")
        .env_remove("DUALSEARCH_ES_PORT")
        .env_remove("DUALSEARCH_ES_INDEX")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn search_es_json_outputs_hits_in_backend_order() {
    let mock = MockElastic::spawn();
    let tmp = tempdir().expect("tempdir");

    let port = mock.port.to_string();
    let assert = isolated_cmd(tmp.path())
        .args([
            "search",
            "moby dick",
            "--backend",
            "es",
            "--es-host",
            "127.0.0.1",
            "--es-port",
            &port,
            "--es-index",
            INDEX,
            "--format",
            "json",
        ])
        .assert()
        .success();

    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");
    assert_eq!(value["version"], "1.0.0");
    assert_eq!(value["backend"], "es");
    assert_eq!(value["query"], "moby dick");
    assert!(value["elapsed_ms"].is_u64());

    let ids: Vec<_> = value["hits"]
        .as_array()
        .expect("hits array")
        .iter()
        .map(|h| h["id"].as_str().expect("id").to_string())
        .collect();
    assert_eq!(ids, vec!["2701", "15", "11231"]);
}

#[test]
fn search_table_output_formats_titles_and_authors() {
    let mock = MockElastic::spawn();
    let tmp = tempdir().expect("tempdir");

    let port = mock.port.to_string();
    isolated_cmd(tmp.path())
        .env("DUALSEARCH_ES_HOST", "127.0.0.1")
        .env("DUALSEARCH_ES_PORT", &port)
        .args(["search", "moby dick", "--backend", "es"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Elasticsearch (es): moby dick"))
        .stdout(predicate::str::contains("Moby Dick - Or, The Whale"))
        .stdout(predicate::str::contains("Melville"))
        .stdout(predicate::str::contains("3 hits in"));
}

#[test]
fn search_with_unknown_backend_exits_with_usage_status() {
    let tmp = tempdir().expect("tempdir");

    isolated_cmd(tmp.path())
        .args(["search", "emma", "--backend", "solr"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(
            "invalid backend identifier `solr`",
        ));
}

#[test]
fn search_without_backend_is_rejected() {
    let tmp = tempdir().expect("tempdir");

    isolated_cmd(tmp.path())
        .args(["search", "emma"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no backend selected"));
}

#[test]
fn search_server_error_reports_transport_failure() {
    let mock = MockElastic::spawn();
    let tmp = tempdir().expect("tempdir");

    let port = mock.port.to_string();
    isolated_cmd(tmp.path())
        .args([
            "search",
            "boom",
            "--backend",
            "es",
            "--es-host",
            "127.0.0.1",
            "--es-port",
            &port,
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("es transport failure"));
}

#[test]
fn get_prints_record_or_not_found() {
    let mock = MockElastic::spawn();
    let tmp = tempdir().expect("tempdir");
    let port = mock.port.to_string();

    let connection = [
        "--es-host",
        "127.0.0.1",
        "--es-port",
        port.as_str(),
        "--es-index",
        INDEX,
    ];

    isolated_cmd(tmp.path())
        .args(["get", "2701", "--backend", "es"])
        .args(connection)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"id\": \"2701\""));

    isolated_cmd(tmp.path())
        .args(["get", "404", "--backend", "es"])
        .args(connection)
        .assert()
        .success()
        .stdout(predicate::str::contains("404: not found"));
}

#[test]
fn get_without_id_is_rejected() {
    let tmp = tempdir().expect("tempdir");

    isolated_cmd(tmp.path())
        .args(["get", "--backend", "pg"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no record identifier"));
}

#[test]
fn no_subcommand_prints_help() {
    let tmp = tempdir().expect("tempdir");

    isolated_cmd(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("compare"));
}
