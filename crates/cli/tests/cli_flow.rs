use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn docqa(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("docqa").expect("binary");
    cmd.env("DOCQA_EMBEDDING_MODE", "stub")
        .env("DOCQA_EMBEDDING_DIMENSION", "64")
        .env("DOCQA_DATA_DIR", data_dir)
        .env_remove("DOCQA_CONFIG")
        .env_remove("DOCQA_DOC_ID_PREFIX")
        .env_remove("DOCQA_DEFAULT_K")
        .env_remove("DOCQA_MAX_K")
        .arg("--quiet");
    cmd
}

fn run_ok(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn run_err(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(!output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    body["error"].clone()
}

#[test]
fn ingest_is_idempotent_across_runs() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");

    let first = run_ok(docqa(&data).args(["ingest", "--text", "Document 1"]));
    assert_eq!(first["doc_id"], "doc_0");
    assert_eq!(first["added"], true);
    assert_eq!(first["index_size"], 1);
    assert_eq!(first["language"], "en");

    run_ok(docqa(&data).args(["ingest", "--text", "Document 2"]));
    run_ok(docqa(&data).args(["ingest", "--text", "Document 3"]));

    let again = run_ok(docqa(&data).args(["ingest", "--text", "Document 1"]));
    assert_eq!(again["doc_id"], "doc_0");
    assert_eq!(again["added"], false);
    assert_eq!(again["index_size"], 3);

    assert!(data.join("index.bin").exists());
    assert!(data.join("metadata.json").exists());
}

#[test]
fn file_ingest_single_and_batch_shapes() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    let a = temp.path().join("a.txt");
    let b = temp.path().join("b.txt");
    fs::write(&a, "東京は日本の首都です").unwrap();
    fs::write(&b, "Paris is the capital of France").unwrap();

    let single = run_ok(docqa(&data).arg("ingest").arg(&a));
    assert_eq!(single["filename"], "a.txt");
    assert_eq!(single["language"], "ja");

    let batch = run_ok(docqa(&data).arg("ingest").arg(&a).arg(&b));
    assert_eq!(batch["files_processed"], 2);
    assert_eq!(batch["index_size"], 2);
    assert_eq!(batch["results"][0]["added"], false);
    assert_eq!(batch["results"][1]["added"], true);
}

#[test]
fn retrieve_returns_ranked_snippets() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    for text in ["alpha bravo", "charlie delta", "echo foxtrot", "golf hotel"] {
        run_ok(docqa(&data).args(["ingest", "--text", text]));
    }

    let body = run_ok(docqa(&data).args(["retrieve", "charlie delta", "-k", "2"]));
    let results = body["results"].as_array().expect("results array");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["doc_id"], "doc_1");
    assert_eq!(results[0]["snippet"], "charlie delta");
    assert!(results[0]["score"].as_f64().unwrap() <= results[1]["score"].as_f64().unwrap());

    let default_k = run_ok(docqa(&data).args(["retrieve", "anything"]));
    assert_eq!(default_k["results"].as_array().map(Vec::len), Some(3));
}

#[test]
fn retrieve_on_empty_store_is_empty() {
    let temp = tempdir().unwrap();
    let body = run_ok(docqa(&temp.path().join("data")).args(["retrieve", "hello"]));
    assert_eq!(body["results"], Value::Array(Vec::new()));
}

#[test]
fn validation_errors_use_stable_codes() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    let csv = temp.path().join("table.csv");
    fs::write(&csv, "a,b").unwrap();

    let err = run_err(docqa(&data).arg("ingest").arg(&csv));
    assert_eq!(err["code"], "unsupported_file");

    let err = run_err(docqa(&data).args(["ingest", "--text", "   "]));
    assert_eq!(err["code"], "empty_content");

    let err = run_err(docqa(&data).args(["retrieve", "query", "-k", "0"]));
    assert_eq!(err["code"], "invalid_k");

    let err = run_err(docqa(&data).args(["retrieve", "query", "-k", "101"]));
    assert_eq!(err["code"], "invalid_k");

    let err = run_err(docqa(&data).args(["retrieve", " "]));
    assert_eq!(err["code"], "empty_query");
}

#[test]
fn config_file_sets_doc_id_prefix() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    let config = temp.path().join("docqa.toml");
    fs::write(&config, "[store]\ndoc_id_prefix = \"note_\"\n").unwrap();

    let body = run_ok(
        docqa(&data)
            .arg("--config")
            .arg(&config)
            .args(["ingest", "--text", "configured"]),
    );
    assert_eq!(body["doc_id"], "note_0");
}

#[test]
fn stats_and_schema() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    run_ok(docqa(&data).args(["ingest", "--text", "hello there"]));

    let stats = run_ok(docqa(&data).arg("stats"));
    assert_eq!(stats["documents"], 1);
    assert_eq!(stats["dimension"], 64);
    assert_eq!(stats["index_kind"], "flat_l2");
    assert_eq!(stats["embedding_model"], "stub");
    assert_eq!(stats["languages"]["en"], 1);

    docqa(&data)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("RetrieveResponse"));
}

#[test]
#[allow(deprecated)]
fn logs_stay_off_stdout() {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    let mut cmd = Command::cargo_bin("docqa").expect("binary");
    cmd.env("DOCQA_EMBEDDING_MODE", "stub")
        .env("DOCQA_DATA_DIR", &data)
        .env_remove("DOCQA_CONFIG")
        .env("RUST_LOG", "debug")
        .args(["ingest", "--text", "logged"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stderr(predicate::str::contains("doc_0"));
}
