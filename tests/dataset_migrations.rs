use std::io::Write;

use inkpress::application::migrations::{
    MigrationOptions, NormalizeBodyMarkdown, SyncPostSeo, run_migration,
};
use inkpress::application::repos::{DocumentStore, RepoError};
use inkpress::domain::documents::DocumentPatch;
use inkpress::infra::dataset::NdjsonDataset;
use serde_json::json;
use tempfile::NamedTempFile;

const FIXTURE: &str = r###"{"_id":"p1","_type":"post","_rev":"r1","title":"Fullwidth","bodyMarkdown":"＃＃ 見出し\n＊＊強調＊＊です"}
{"_id":"p2","_type":"post","_rev":"r1","title":"Clean","bodyMarkdown":"## Clean\n**ok**"}

{"_id":"page-1","_type":"page","_rev":"r1","title":"About","bodyMarkdown":"＊＊about＊＊"}
{"_id":"s1","_type":"siteSettings","siteUrl":"https://example.com/"}
"###;

fn dataset_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write dataset");
    file
}

fn apply(chunk_size: usize) -> MigrationOptions {
    MigrationOptions {
        apply: true,
        chunk_size,
    }
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let file = dataset_file(FIXTURE);
    let dataset = NdjsonDataset::new(file.path());

    let report = run_migration(
        &dataset,
        &NormalizeBodyMarkdown::default(),
        MigrationOptions::default(),
    )
    .await
    .expect("dry run");

    assert_eq!(report.checked, 2);
    assert_eq!(report.changed, 1);
    assert_eq!(report.committed, 0);
    assert_eq!(report.preview[0].id, "p1");
    assert_eq!(report.preview[0].title, "Fullwidth");
    assert!(
        report
            .lines()
            .last()
            .is_some_and(|line| line.contains("dry-run complete"))
    );

    let after = std::fs::read_to_string(file.path()).expect("read dataset");
    assert_eq!(after, FIXTURE);
}

#[tokio::test]
async fn apply_writes_and_second_run_is_clean() {
    let file = dataset_file(FIXTURE);
    let dataset = NdjsonDataset::new(file.path());
    let migration = NormalizeBodyMarkdown::new(["post", "page"]);

    let report = run_migration(&dataset, &migration, apply(1))
        .await
        .expect("apply");
    assert_eq!(report.checked, 3);
    assert_eq!(report.changed, 2);
    assert_eq!(report.committed, 2);
    assert!(report.to_string().ends_with("done. updated=2"));

    let documents = dataset.load().await.expect("reload");
    let p1 = documents
        .iter()
        .find(|document| document.id() == Some("p1"))
        .expect("p1");
    assert_eq!(p1.get_str("bodyMarkdown"), Some("## 見出し\n**強調**です"));
    assert_ne!(p1.rev(), Some("r1"));
    let p2 = documents
        .iter()
        .find(|document| document.id() == Some("p2"))
        .expect("p2");
    assert_eq!(p2.rev(), Some("r1"));
    // Untouched rows keep their fields, including ones no view models.
    assert!(
        documents
            .iter()
            .any(|document| document.get_str("siteUrl") == Some("https://example.com/"))
    );

    let again = run_migration(&dataset, &migration, apply(50))
        .await
        .expect("second run");
    assert_eq!(again.changed, 0);
    assert_eq!(again.committed, 0);
}

#[tokio::test]
async fn sync_seo_fills_missing_fields() {
    let file = dataset_file(
        r#"{"_id":"p1","_type":"post","title":"Hello","excerpt":"A short summary.","seo":{"canonicalUrl":"https://example.com/x"}}
"#,
    );
    let dataset = NdjsonDataset::new(file.path());

    let report = run_migration(&dataset, &SyncPostSeo::default(), apply(50))
        .await
        .expect("apply");
    assert_eq!(report.changed, 1);

    let documents = dataset.load().await.expect("reload");
    assert_eq!(
        documents[0].get("seo"),
        Some(&json!({
            "canonicalUrl": "https://example.com/x",
            "title": "Hello",
            "description": "A short summary."
        }))
    );
}

#[tokio::test]
async fn untouched_rows_are_rewritten_byte_for_byte() {
    let untouched = [
        r#"{"_type":"page","_id":"pg","zeta":1,"alpha":{"y":true,"b":[3,1]},"title":"About"}"#,
        r#"{"_id":"s1","_type":"siteSettings","siteUrl":"https://example.com/","extra":null}"#,
    ];
    let contents = format!(
        "{}\n{}\n{}\n",
        untouched[0],
        r#"{"_rev":"r1","_type":"post","_id":"p1","bodyMarkdown":"＊＊strong＊＊","z":0}"#,
        untouched[1],
    );
    let file = dataset_file(&contents);
    let dataset = NdjsonDataset::new(file.path());

    let report = run_migration(&dataset, &NormalizeBodyMarkdown::default(), apply(50))
        .await
        .expect("apply");
    assert_eq!(report.committed, 1);

    let after = std::fs::read_to_string(file.path()).expect("read dataset");
    let lines: Vec<&str> = after.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], untouched[0]);
    assert_eq!(lines[2], untouched[1]);
    // The patched row keeps its key order too.
    assert!(lines[1].starts_with(r#"{"_rev":""#), "{}", lines[1]);
    assert!(
        lines[1].ends_with(r#"","_type":"post","_id":"p1","bodyMarkdown":"**strong**","z":0}"#),
        "{}",
        lines[1]
    );
}

#[tokio::test]
async fn unknown_patch_id_leaves_file_untouched() {
    let file = dataset_file(FIXTURE);
    let dataset = NdjsonDataset::new(file.path());

    let err = dataset
        .commit(vec![
            DocumentPatch::set_field("p1", "title", json!("Changed")),
            DocumentPatch::set_field("missing", "title", json!("Nope")),
        ])
        .await
        .expect_err("unknown id");
    assert!(matches!(err, RepoError::NotFound { ref id } if id == "missing"));

    let after = std::fs::read_to_string(file.path()).expect("read dataset");
    assert_eq!(after, FIXTURE);
}

#[tokio::test]
async fn malformed_dataset_is_a_store_error() {
    let file = dataset_file("{\"_id\":\"p1\",\"_type\":\"post\"}\n{oops\n");
    let dataset = NdjsonDataset::new(file.path());

    let err = run_migration(
        &dataset,
        &NormalizeBodyMarkdown::default(),
        MigrationOptions::default(),
    )
    .await
    .expect_err("malformed");
    assert!(err.to_string().contains("line 2"), "{err}");
}
