//! Tests for the command-line entry points.
#![allow(clippy::unwrap_used)]

use anyhow::Result;
use assert_cmd::Command;
use declfix::entry_point::run_with_args_to;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SOURCE: &str = "import { build } from './build';\n\nexport function make() {\n  return build();\n}\n";

/// Write a one-file project with a manifest holding `change_sets` fixes.
fn project(change_sets: usize) -> Result<TempDir> {
    let temp = TempDir::new()?;
    fs::create_dir_all(temp.path().join("src"))?;
    fs::write(temp.path().join("src/index.ts"), SOURCE)?;

    let at = SOURCE.find("make()").unwrap() + "make()".len();
    let change = format!(
        r#"{{"fileName": "src/index.ts", "textChanges": [{{"span": {{"start": {at}, "length": 0}}, "newText": ": import(\"./widget\").Widget"}}]}}"#
    );
    let changes = vec![change; change_sets].join(", ");
    fs::write(
        temp.path().join("declfix-manifest.json"),
        format!(
            r#"{{"files": [{{"fileName": "src/index.ts", "fixes": {{"fixMissingTypeAnnotationOnExports": {{"changes": [{changes}]}}}}}}]}}"#
        ),
    )?;
    Ok(temp)
}

fn declfix(dir: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("declfix-bin")?;
    cmd.current_dir(dir).env("NO_COLOR", "1");
    Ok(cmd)
}

#[test]
fn test_apply_rewrites_file() -> Result<()> {
    let temp = project(1)?;

    declfix(temp.path())?
        .arg("--apply")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed:"))
        .stdout(predicate::str::contains("src/index.ts"));

    let fixed = fs::read_to_string(temp.path().join("src/index.ts"))?;
    assert_eq!(
        fixed,
        "import { build } from './build';\nimport {Widget} from './widget';\n\nexport function make(): Widget {\n  return build();\n}\n"
    );
    Ok(())
}

#[test]
fn test_dry_run_is_default() -> Result<()> {
    let temp = project(1)?;

    declfix(temp.path())?
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN]"))
        .stdout(predicate::str::contains("Would fix src/index.ts"));

    assert_eq!(fs::read_to_string(temp.path().join("src/index.ts"))?, SOURCE);
    Ok(())
}

#[test]
fn test_multiple_fixes_for_one_file_fails() -> Result<()> {
    let temp = project(2)?;

    declfix(temp.path())?
        .arg("--apply")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("expected at most one combined fix"));

    assert_eq!(fs::read_to_string(temp.path().join("src/index.ts"))?, SOURCE);
    Ok(())
}

#[test]
fn test_invalid_config_fails() -> Result<()> {
    let temp = project(1)?;
    fs::write(temp.path().join(".declfix.toml"), "[declfix\n")?;

    declfix(temp.path())?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
    Ok(())
}

#[test]
fn test_missing_manifest_fails() -> Result<()> {
    let temp = TempDir::new()?;

    declfix(temp.path())?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load fix manifest"));
    Ok(())
}

#[test]
fn test_allow_list_with_only_missing_files_fails() -> Result<()> {
    let temp = project(1)?;

    declfix(temp.path())?
        .args(["--apply", "src/missing.ts"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("none of the requested files exist"));
    Ok(())
}

#[test]
fn test_config_file_supplies_manifest() -> Result<()> {
    let temp = project(1)?;
    fs::create_dir_all(temp.path().join("out"))?;
    fs::rename(
        temp.path().join("declfix-manifest.json"),
        temp.path().join("out/fixes.json"),
    )?;
    // The manifest's directory is the project root by default
    let moved = fs::read_to_string(temp.path().join("out/fixes.json"))?;
    fs::write(
        temp.path().join("out/fixes.json"),
        moved.replacen('{', r#"{"currentDirectory": "..", "#, 1),
    )?;
    fs::write(
        temp.path().join(".declfix.toml"),
        "[declfix]\nmanifest = \"out/fixes.json\"\n",
    )?;

    declfix(temp.path())?.arg("-a").assert().success();

    assert!(fs::read_to_string(temp.path().join("src/index.ts"))?.contains("make(): Widget"));
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let temp = project(1)?;

    let output = declfix(temp.path())?.arg("--json").output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["dry_run"], true);
    assert_eq!(value["files"][0]["file"], "src/index.ts");
    assert_eq!(value["files"][0]["imports"][0]["identifiers"][0], "Widget");
    Ok(())
}

#[test]
fn test_init_subcommand() -> Result<()> {
    let temp = TempDir::new()?;

    declfix(temp.path())?
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created .declfix.toml"));

    assert!(temp.path().join(".declfix.toml").exists());
    Ok(())
}

#[test]
fn test_version_and_help_exit_zero() {
    let mut buffer = Vec::new();
    assert_eq!(
        run_with_args_to(vec!["--version".to_owned()], &mut buffer).unwrap(),
        0
    );
    assert!(String::from_utf8(buffer).unwrap().contains("declfix"));

    let mut buffer = Vec::new();
    assert_eq!(
        run_with_args_to(vec!["--help".to_owned()], &mut buffer).unwrap(),
        0
    );
    assert!(String::from_utf8(buffer)
        .unwrap()
        .contains("CONFIGURATION FILE (.declfix.toml)"));
}

#[test]
fn test_bad_flag_exits_one() {
    let mut buffer = Vec::new();
    assert_eq!(
        run_with_args_to(vec!["--span-encoding".to_owned(), "latin1".to_owned()], &mut buffer)
            .unwrap(),
        1
    );
}
