use std::{fs, path::PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn pubs(dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("pubs")?;
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG").current_dir(dir.path());
    Ok(cmd)
}

fn read_json(path: &std::path::Path) -> Result<Value, Box<dyn std::error::Error>> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}

fn titles(doc: &Value) -> Vec<String> {
    doc["publications"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(|p| p["title"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn import_merges_every_format() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("data").join("publications.json");

    let output = pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(fixture("scholar_rows.html"))
        .arg(fixture("refs.bib"))
        .arg(fixture("copied.txt"))
        .output()?;
    assert!(output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("✓ 3") && stderr.contains("✗ 0"),
        "stderr summary mismatch. stderr=\n{}",
        stderr
    );

    let doc = read_json(&out)?;
    assert_eq!(
        titles(&doc),
        ["Tiny Models", "Sparse Attention for Graphs", "Older Work"]
    );

    let sparse = &doc["publications"][1];
    assert_eq!(sparse["journal"], "NeurIPS");
    assert_eq!(sparse["citations"], 12);
    assert!(
        sparse["links"]["paper"]
            .as_str()
            .is_some_and(|p| p.starts_with("https://scholar.google.com/citations"))
    );
    assert_eq!(sparse["links"]["code"], Value::Null);

    let older = &doc["publications"][2];
    assert_eq!(older["authors"], "Carol Doe");
    assert_eq!(older["citations"], 20);

    assert_eq!(doc["metrics"]["total_citations"], 35);
    assert_eq!(doc["metrics"]["h_index"], 3);
    assert_eq!(doc["metrics"]["i10_index"], 2);

    let keys: Vec<_> = doc.as_object().map(|o| o.keys().cloned().collect()).unwrap_or_default();
    assert_eq!(keys.len(), 3);
    assert!(doc["profile"]["last_updated"].as_str().is_some_and(|d| d.len() == 10));
    Ok(())
}

#[test]
fn incoming_wins_policy_overwrites_descriptions() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");

    let output = pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .args(["import", "--policy", "incoming-wins"])
        .arg(fixture("scholar_rows.html"))
        .arg(fixture("refs.bib"))
        .output()?;
    assert!(output.status.success());

    let doc = read_json(&out)?;
    let sparse = &doc["publications"][1];
    assert_eq!(sparse["title"], "Sparse Attention for Graphs");
    assert_eq!(sparse["journal"], "Advances in Neural Information Processing Systems");
    assert_eq!(sparse["links"]["paper"], "https://example.org/sparse.pdf");
    // Citations still take the larger count.
    assert_eq!(sparse["citations"], 12);
    Ok(())
}

#[test]
fn missing_source_is_reported_and_others_still_import() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");

    let output = pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(dir.path().join("nope.html"))
        .arg(fixture("refs.bib"))
        .output()?;
    assert!(output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(
        stderr.contains("nope.html") && stderr.contains("✓ 1") && stderr.contains("✗ 1"),
        "stderr mismatch. stderr=\n{}",
        stderr
    );
    assert_eq!(titles(&read_json(&out)?), ["Sparse Attention for Graphs", "Older Work"]);
    Ok(())
}

#[test]
fn nothing_is_written_when_every_source_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");
    let empty = dir.path().join("empty.txt");
    fs::write(&empty, "\n")?;

    let output = pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(&empty)
        .arg(dir.path().join("missing.bib"))
        .output()?;
    assert!(output.status.success());
    let stderr = String::from_utf8(strip_ansi_escapes::strip(output.stderr))?;
    assert!(stderr.contains("✓ 0") && stderr.contains("✗ 2"), "stderr=\n{}", stderr);
    assert!(!out.exists());
    Ok(())
}

#[test]
fn corrupt_snapshot_is_left_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");
    fs::write(&out, "{ \"publications\": [")?;

    pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(fixture("refs.bib"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("refusing to overwrite"));
    assert_eq!(fs::read_to_string(&out)?, "{ \"publications\": [");
    Ok(())
}

#[test]
fn import_merges_into_existing_snapshot() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");
    fs::copy(fixture("publications.json"), &out)?;

    let output = pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(format!("text:{}", fixture("copied.txt").display()))
        .output()?;
    assert!(output.status.success());

    let doc = read_json(&out)?;
    assert_eq!(titles(&doc), ["Older Work", "Kept By Hand"]);
    let kept = &doc["publications"][1];
    assert_eq!(kept["year"], "2018");
    assert_eq!(kept["citations"], 5);
    assert_eq!(kept["links"]["paper"], Value::Null);
    assert_eq!(kept["links"]["code"], "https://example.org/code");
    assert_eq!(doc["profile"]["scholar_id"], "abc");
    assert_ne!(doc["profile"]["last_updated"], "2020-01-01");
    Ok(())
}

#[test]
fn replace_starts_from_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");
    fs::copy(fixture("publications.json"), &out)?;

    pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .args(["import", "--replace"])
        .arg(fixture("copied.txt"))
        .assert()
        .success();
    assert_eq!(titles(&read_json(&out)?), ["Older Work"]);
    Ok(())
}

#[test]
fn homepage_metrics_take_precedence() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");

    pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .arg("import")
        .arg(fixture("scholar_rows.html"))
        .arg("--homepage")
        .arg(fixture("profile.html"))
        .assert()
        .success();

    let doc = read_json(&out)?;
    assert_eq!(doc["metrics"]["total_citations"], 250);
    assert_eq!(doc["metrics"]["h_index"], 7);
    assert_eq!(doc["metrics"]["i10_index"], 4);
    Ok(())
}

#[test]
fn no_metrics_keeps_stored_figures() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let out = dir.path().join("publications.json");
    fs::copy(fixture("publications.json"), &out)?;

    pubs(&dir)?
        .arg("-o")
        .arg(&out)
        .args(["import", "--no-metrics"])
        .arg(fixture("copied.txt"))
        .assert()
        .success();
    let doc = read_json(&out)?;
    assert_eq!(doc["metrics"]["total_citations"], 6);
    assert_eq!(doc["metrics"]["h_index"], 1);
    Ok(())
}
