//! Integration tests for the pdfsift binary

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the user's config and embedding service
fn pdfsift_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pdfsift").unwrap();
    cmd.arg("--config")
        .arg(config_dir.join("missing.yml"))
        .env("PDFSIFT_EMBEDDING_URL", "http://127.0.0.1:9")
        .env_remove("RUST_LOG");
    cmd
}

fn show(font: &str, size: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![72.into(), y.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// One-page PDF with a bold heading and body lines
fn write_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut operations = show("F2", 16, 720, "Packing Essentials");
    operations.extend(show("F1", 11, 690, "Bring light layers for the coast"));
    operations.extend(show("F1", 11, 676, "and comfortable walking shoes"));
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn test_help_lists_commands() {
    let temp = TempDir::new().unwrap();
    pdfsift_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("manifest"))
        .stdout(predicate::str::contains("outline"));
}

#[test]
fn test_manifest_writes_next_to_docs_dir() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("PDFs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("Lunch Ideas.pdf"), b"%PDF-1.4").unwrap();
    fs::write(docs.join("readme.txt"), b"not a pdf").unwrap();

    pdfsift_cmd(temp.path())
        .arg("manifest")
        .arg("--docs-dir")
        .arg(&docs)
        .arg("--persona")
        .arg("Food Contractor")
        .arg("--job")
        .arg("Prepare a vegetarian buffet")
        .assert()
        .success()
        .stdout(predicate::str::contains("with 1 documents"));

    let content = fs::read_to_string(temp.path().join("challenge1b_input.json")).unwrap();
    let manifest: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(manifest["documents"][0]["title"], "Lunch Ideas");
    assert_eq!(manifest["persona"]["role"], "Food Contractor");
    assert!(manifest["challenge_info"]["challenge_id"]
        .as_str()
        .unwrap()
        .starts_with("round_1b_"));
}

#[test]
fn test_missing_docs_dir_exits_not_found() {
    let temp = TempDir::new().unwrap();
    pdfsift_cmd(temp.path())
        .arg("manifest")
        .arg("--docs_dir")
        .arg(temp.path().join("nope"))
        .arg("--persona")
        .arg("p")
        .arg("--job")
        .arg("j")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_unknown_strategy_rejected() {
    let temp = TempDir::new().unwrap();
    let pdf = temp.path().join("guide.pdf");
    write_pdf(&pdf);

    pdfsift_cmd(temp.path())
        .arg("chunk")
        .arg(&pdf)
        .arg("--strategy")
        .arg("fancy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown chunking strategy"));
}

#[test]
fn test_outline_reports_bold_heading() {
    let temp = TempDir::new().unwrap();
    let pdf = temp.path().join("guide.pdf");
    write_pdf(&pdf);

    let output = pdfsift_cmd(temp.path())
        .arg("outline")
        .arg(&pdf)
        .output()
        .unwrap();
    assert!(output.status.success());

    let outline: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(outline["title"].is_null());
    assert_eq!(outline["headings"]["0"][0]["text"], "Packing Essentials");
    assert_eq!(outline["headings"]["0"][0]["level"], "H1");
}

#[test]
fn test_chunk_labels_sections() {
    let temp = TempDir::new().unwrap();
    let pdf = temp.path().join("guide.pdf");
    write_pdf(&pdf);

    let output = pdfsift_cmd(temp.path())
        .arg("chunk")
        .arg(&pdf)
        .arg("--strategy")
        .arg("simple")
        .output()
        .unwrap();
    assert!(output.status.success());

    let sections: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &sections[0];
    assert_eq!(first["file"], "guide.pdf");
    assert_eq!(first["page"], 1);
    assert_eq!(first["heading"], "Packing Essentials");
    assert!(first["text"].as_str().unwrap().contains("walking shoes"));
}

#[test]
fn test_run_without_documents_writes_empty_ranking() {
    let temp = TempDir::new().unwrap();
    let docs = temp.path().join("PDFs");
    fs::create_dir(&docs).unwrap();

    pdfsift_cmd(temp.path())
        .arg("run")
        .arg("--docs-dir")
        .arg(&docs)
        .arg("--persona")
        .arg("Travel Planner")
        .arg("--job")
        .arg("Plan a trip")
        .assert()
        .success();

    let content = fs::read_to_string(temp.path().join("challenge1b_output.json")).unwrap();
    let output: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(output["metadata"]["persona"], "Travel Planner");
    assert_eq!(output["extracted_sections"].as_array().unwrap().len(), 0);
}
