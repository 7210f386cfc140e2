use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn ginx_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ginx"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    let parent = path.parent().expect("parent");
    fs::create_dir_all(parent).expect("create dirs");
    fs::write(path, contents).expect("write fixture");
}

fn site() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    write(dir.path(), "index.html", "<title>{{ title }}</title>");
    write(
        dir.path(),
        "sub/page.html",
        "<p>{{ items | length }} items</p>",
    );
    write(dir.path(), "readme.txt", "not a template");
    dir
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_lists_registered_names() {
    let dir = site();
    ginx_cmd()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("index"))
        .stdout(contains("sub/page"))
        .stdout(contains("readme").not())
        .stdout(contains("2 template(s)"));
}

#[test]
fn check_json_output() {
    let dir = site();
    let output = ginx_cmd()
        .arg("check")
        .arg(dir.path())
        .arg("--json")
        .output()
        .expect("run ginx");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let expected = serde_json::json!(["index", "sub/page"]);
    assert_eq!(report["templates"], expected);
}

#[test]
fn check_honours_ext_flag() {
    let dir = site();
    write(dir.path(), "mail/welcome.tpl", "hi");
    ginx_cmd()
        .args(["check", "--ext", "tpl"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(contains("mail/welcome"))
        .stdout(contains("index").not());
}

#[test]
fn check_reports_parse_error_with_name() {
    let dir = site();
    write(dir.path(), "broken.html", "{% for %}");
    ginx_cmd()
        .arg("check")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(contains("failed to load templates"))
        .stderr(contains("\"broken\""));
}

#[test]
fn check_missing_root_fails() {
    let dir = TempDir::new().unwrap();
    ginx_cmd()
        .arg("check")
        .arg(dir.path().join("absent"))
        .assert()
        .failure()
        .stderr(contains("absent"));
}

// ---------------------------------------------------------------------------
// render
// ---------------------------------------------------------------------------

#[test]
fn render_with_json_data() {
    let dir = site();
    write(dir.path(), "data.json", r#"{"title": "Index title!"}"#);
    ginx_cmd()
        .arg("render")
        .arg(dir.path())
        .arg("index")
        .arg("--data")
        .arg(dir.path().join("data.json"))
        .assert()
        .success()
        .stdout(predicate::eq("<title>Index title!</title>"));
}

#[test]
fn render_with_yaml_data() {
    let dir = site();
    write(dir.path(), "data.yaml", "items:\n  - a\n  - b\n  - c\n");
    ginx_cmd()
        .arg("render")
        .arg(dir.path())
        .arg("sub/page")
        .arg("--data")
        .arg(dir.path().join("data.yaml"))
        .assert()
        .success()
        .stdout(contains("<p>3 items</p>"));
}

#[test]
fn render_unknown_name_fails_without_output() {
    let dir = site();
    ginx_cmd()
        .args(["render"])
        .arg(dir.path())
        .arg("readme")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(contains("not found"));
}

#[test]
fn render_with_custom_delimiters_from_config() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "tpl/hello.html", "{{ raw }} [[ name ]]");
    write(
        dir.path(),
        "ginx.yaml",
        "delimiters: { left: \"[[\", right: \"]]\" }\n",
    );
    write(dir.path(), "data.json", r#"{"name": "world"}"#);
    ginx_cmd()
        .arg("render")
        .arg(dir.path().join("tpl"))
        .arg("hello")
        .arg("--config")
        .arg(dir.path().join("ginx.yaml"))
        .arg("--data")
        .arg(dir.path().join("data.json"))
        .assert()
        .success()
        .stdout(predicate::eq("{{ raw }} world"));
}

#[test]
fn verbose_flag_logs_loading() {
    let dir = site();
    ginx_cmd()
        .args(["-vv", "check"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(contains("registered template \"index\""));
}
