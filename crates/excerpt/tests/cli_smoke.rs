use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn excerpt() -> Command {
    let mut cmd = Command::cargo_bin("excerpt").expect("binary exists");
    cmd.env_remove("EXCERPT_TAG").env_remove("EXCERPT_FORMAT");
    cmd
}

#[test]
fn help_displays_usage() {
    excerpt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn resolve_prints_lines() {
    excerpt()
        .args(["resolve", "!3,!7", "--lines", "10"])
        .assert()
        .success()
        .stdout("1,2,4,5,6,8,9,10\n");
}

#[test]
fn resolve_reports_legacy_syntax() {
    excerpt()
        .args(["resolve", "5-7,11", "--lines", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'5-7'").and(predicate::str::contains("'5:7'")));
}

#[test]
fn show_prints_selected_lines() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("demo.ts"),
        "const a = 1;\nconst b = 2;\nconst c = 3;\nconsole.log(a + c);\n",
    )
    .unwrap();

    excerpt()
        .current_dir(temp.path())
        .args(["show", "demo.ts[1:4,!2]"])
        .assert()
        .success()
        .stdout("const a = 1;\nconst c = 3;\nconsole.log(a + c);\n");

    excerpt()
        .current_dir(temp.path())
        .args(["show", "demo.ts[-2]", "--block"])
        .assert()
        .success()
        .stdout("### Example\n```ts\nconsole.log(a + c);\n```\n");
}

#[test]
fn show_fails_for_missing_example() {
    let temp = tempfile::tempdir().unwrap();
    excerpt()
        .current_dir(temp.path())
        .args(["show", "nowhere.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("example file not found: nowhere.ts"));
}

#[test]
fn scan_renders_report_and_fails_on_bad_includes() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(
        root.join("src/Publisher.ts"),
        "/**\n * A publisher.\n *\n * @includeExample src/Publisher.example.ts[-2:]\n */\nexport class Publisher {}\n",
    )
    .unwrap();
    fs::write(
        root.join("src/Publisher.example.ts"),
        "const publisher = new Publisher();\npublisher.prepare();\npublisher.publish();",
    )
    .unwrap();

    excerpt()
        .arg("scan")
        .arg(root)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("## src/Publisher.ts:4")
                .and(predicate::str::contains("publisher.prepare();\npublisher.publish();"))
                .and(predicate::str::contains("new Publisher()").not()),
        );

    fs::write(
        root.join("src/Broken.ts"),
        "/** @includeExample src/Publisher.example.ts[2-3] */\nexport {};\n",
    )
    .unwrap();

    excerpt()
        .args(["scan", "--format", "json"])
        .arg(root)
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"failures\""))
        .stderr(predicate::str::contains("1 include(s) could not be resolved"));
}
