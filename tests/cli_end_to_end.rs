use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::{NamedTempFile, TempDir};

const DATASET: &str = r#"{"_id":"settings","_type":"siteSettings","siteTitle":"Notes","siteUrl":"https://example.com/"}
{"_id":"p1","_type":"post","title":"Hello","slug":{"current":"hello"},"publishedAt":"2024-05-01T09:00:00Z","excerpt":"First post.","bodyMarkdown":"＃＃ Intro\n＊＊bold＊＊\n\n## Intro"}
{"_id":"page-about","_type":"page","title":"About","slug":{"current":"about"}}
"#;

fn dataset_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("tmp file");
    file.write_all(contents.as_bytes()).expect("write dataset");
    file
}

fn inkpress() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("inkpress"));
    cmd.env_remove("INKPRESS_CONFIG_FILE")
        .env_remove("INKPRESS__DATASET__PATH")
        .env_remove("INKPRESS__SITE__URL")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn normalize_reads_stdin() {
    inkpress()
        .arg("normalize")
        .write_stdin("＃＃ 見出し\n＊＊強調＊＊ and `＊＊code＊＊`\n")
        .assert()
        .success()
        .stdout("## 見出し\n**強調** and `＊＊code＊＊`\n");
}

#[test]
fn headings_deduplicate_anchor_ids() {
    let dataset = dataset_file(DATASET);
    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["headings", "--post", "hello"])
        .assert()
        .success()
        .stdout(contains("\"id\": \"intro\"").and(contains("\"id\": \"intro-2\"")));
}

#[test]
fn reading_time_switches_to_word_estimate() {
    let body = "word ".repeat(800);

    inkpress()
        .arg("reading-time")
        .write_stdin(body.clone())
        .assert()
        .success()
        .stdout(contains("\"minutes\": 8"));

    inkpress()
        .args(["reading-time", "--words"])
        .write_stdin(body)
        .assert()
        .success()
        .stdout(contains("\"minutes\": 2").and(contains("2分で読めます")));
}

#[test]
fn sitemap_and_robots_use_site_url() {
    let dataset = dataset_file(DATASET);
    let out_dir = TempDir::new().expect("tmp dir");
    let sitemap = out_dir.path().join("public/sitemap.xml");

    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .arg("sitemap")
        .arg("--out")
        .arg(&sitemap)
        .assert()
        .success();
    let xml = std::fs::read_to_string(&sitemap).expect("sitemap written");
    assert!(xml.contains("<loc>https://example.com/blog/hello</loc>"));
    assert!(xml.contains("<loc>https://example.com/about</loc>"));

    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .arg("robots")
        .assert()
        .success()
        .stdout(contains("Sitemap: https://example.com/sitemap.xml"));
}

#[test]
fn feed_lists_published_posts() {
    let dataset = dataset_file(DATASET);
    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .arg("feed")
        .assert()
        .success()
        .stdout(
            contains("<title>Notes</title>")
                .and(contains("<link>https://example.com/blog/hello</link>"))
                .and(contains("<language>ja</language>")),
        );
}

#[test]
fn migrate_dry_run_then_apply() {
    let dataset = dataset_file(DATASET);

    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["migrate", "normalize-body-markdown"])
        .assert()
        .success()
        .stdout(
            contains("[normalize-body-markdown] checked=1 changed=1 types=post")
                .and(contains("  - p1 | post | Hello"))
                .and(contains("dry-run complete")),
        );
    assert_eq!(
        std::fs::read_to_string(dataset.path()).expect("read dataset"),
        DATASET
    );

    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["migrate", "normalize-body-markdown", "--apply", "--chunk=1"])
        .assert()
        .success()
        .stdout(contains("done. updated=1"));

    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["migrate", "normalize-body-markdown", "--apply"])
        .assert()
        .success()
        .stdout(contains("checked=1 changed=0"));
}

#[test]
fn seo_prints_derived_fields() {
    let dataset = dataset_file(DATASET);
    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["seo", "--post", "hello"])
        .assert()
        .success()
        .stdout(contains("\"title\": \"Hello\""));
}

#[test]
fn unknown_post_fails() {
    let dataset = dataset_file(DATASET);
    inkpress()
        .arg("--dataset")
        .arg(dataset.path())
        .args(["json-ld", "--post", "missing"])
        .assert()
        .failure()
        .stderr(contains("post `missing`"));
}

#[test]
fn missing_dataset_fails_fast() {
    inkpress()
        .arg("sitemap")
        .assert()
        .failure()
        .stderr(contains("dataset path is required"));
}
