/*!
# Pipeline Integration Tests

End-to-end runs over real trees: resolve, load rules, index, rewrite, write,
validate.
*/

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use shiftline_core::{MismatchKind, Orchestrator, ShiftlineConfig, Validator};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for sub in ["src", "dest", "reference"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self, manifest: &Path, rules: &str) -> ShiftlineConfig {
        ShiftlineConfig {
            source_root: self.path("src"),
            manifest_path: manifest.to_path_buf(),
            dest_root: self.path("dest"),
            rule_path: self.write("rules.json", rules),
            reference_root: Some(self.path("reference")),
            ..Default::default()
        }
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }
}

#[test]
fn test_single_rule_rewrites_every_occurrence_in_every_file() {
    let ws = Workspace::new();
    ws.write("src/One.kt", "foo(1)\nval x = foo + foo\nunchanged\n");
    ws.write("src/nested/Two.kt", "// foo\nnothing here\n");

    let config = ws.config(&ws.path("src"), r#"{"from":"foo","to":"bar","multiple":true}"#);
    let summary = Orchestrator::prepare(config).unwrap().run().unwrap();

    assert_eq!(summary.files_processed, 2);
    assert_eq!(ws.read("dest/One.swift"), "bar(1)\nval x = bar + bar\nunchanged\n");
    assert_eq!(ws.read("dest/nested/Two.swift"), "// bar\nnothing here\n");
}

#[test]
fn test_declared_pattern_is_replaced_everywhere_by_default() {
    let ws = Workspace::new();
    ws.write("src/One.kt", "fun foo() = foofoo()\n");
    ws.write("src/Two.kt", "val x = foo_bar + foo\n");

    let config = ws.config(&ws.path("src"), r#"{"from":"foo","to":"bar","multiple":true}"#);
    assert!(!config.declaration_aware);
    let summary = Orchestrator::prepare(config).unwrap().run().unwrap();

    assert_eq!(summary.declarations, 2);
    assert_eq!(ws.read("dest/One.swift"), "fun bar() = barbar()\n");
    assert_eq!(ws.read("dest/Two.swift"), "val x = bar_bar + bar\n");
}

#[test]
fn test_declared_pattern_first_mode_by_default() {
    let ws = Workspace::new();
    ws.write("src/A.kt", "fun foo() = 1\n");
    ws.write("src/B.kt", "val foobar = foo(foo)\n");

    let config = ws.config(&ws.path("src"), r#"{"from":"foo","to":"bar","multiple":false}"#);
    Orchestrator::prepare(config).unwrap().run().unwrap();

    assert_eq!(ws.read("dest/A.swift"), "fun bar() = 1\n");
    assert_eq!(ws.read("dest/B.swift"), "val barbar = foo(foo)\n");
}

#[test]
fn test_declaration_aware_matching_is_opt_in() {
    let ws = Workspace::new();
    ws.write("src/A.kt", "fun foo() = 1\n");
    ws.write("src/B.kt", "val foobar = foo(foo)\n");

    for (multiple, expected) in [
        (false, "val foobar = bar(foo)\n"),
        (true, "val foobar = bar(bar)\n"),
    ] {
        let rule = format!(r#"{{"from":"foo","to":"bar","multiple":{multiple}}}"#);
        let config = ShiftlineConfig {
            declaration_aware: true,
            ..ws.config(&ws.path("src"), &rule)
        };
        Orchestrator::prepare(config).unwrap().run().unwrap();

        assert_eq!(ws.read("dest/B.swift"), expected);
    }
}

#[test]
fn test_manifest_file_order_drives_output_order() {
    let ws = Workspace::new();
    let b = ws.write("src/B.kt", "b\n");
    let a = ws.write("src/A.kt", "a\n");
    let listing = ws.write(
        "sources.txt",
        &format!(
            "{}\n{}\n{}\n",
            b.display(),
            ws.path("src/Missing.kt").display(),
            a.display()
        ),
    );

    let config = ws.config(&listing, r#"{"from":"a","to":"A","multiple":true}"#);
    let summary = Orchestrator::prepare(config).unwrap().run().unwrap();

    assert_eq!(
        summary.produced,
        vec![ws.path("dest/B.swift"), ws.path("dest/A.swift")]
    );
}

#[test]
fn test_kotlin_to_swift_style_rules_with_declaration_renames() {
    let ws = Workspace::new();
    ws.write(
        "src/model/Shape.kt",
        "interface Shape {\n  fun area(): Double\n}\n",
    );
    ws.write(
        "src/app/Main.kt",
        concat!(
            "fun describe(s: Shape): String {\n",
            "  val name = \"Shape ${s.area()}\"\n",
            "  return ShapeFactory.wrap(name)\n",
            "}\n",
        ),
    );
    let rules = [
        r#"["#,
        r#"{"from": "fun ", "to": "func ", "multiple": true},"#,
        r#"{"from": "val ", "to": "let ", "multiple": true},"#,
        r#"{"from": "${", "to": "\\(", "multiple": true},"#,
        r#"{"from": "Shape", "to": "Figure", "multiple": true},"#,
        r#"{"from": ": String {", "to": " -> String {", "multiple": false}"#,
        r#"]"#,
    ]
    .join("\n");

    let config = ShiftlineConfig {
        declaration_aware: true,
        ..ws.config(&ws.path("src"), &rules)
    };
    let summary = Orchestrator::prepare(config).unwrap().run().unwrap();

    assert_eq!(summary.rules_loaded, 5);
    assert_eq!(summary.rules_rejected, 0);
    assert_eq!(
        ws.read("dest/app/Main.swift"),
        concat!(
            "func describe(s: Figure) -> String {\n",
            "  let name = \"Figure \\(s.area()}\"\n",
            "  return ShapeFactory.wrap(name)\n",
            "}\n",
        )
    );
    assert_eq!(
        ws.read("dest/model/Shape.swift"),
        "interface Figure {\n  func area(): Double\n}\n"
    );
}

#[test]
fn test_validation_against_reference_tree() {
    let ws = Workspace::new();
    ws.write("src/A.kt", "val a = 1\nval b = 2\n");
    ws.write("src/B.kt", "val c = 3\n");
    ws.write("reference/A.swift", "let a = 1\nlet b = 2\n");
    ws.write("reference/B.swift", "let c = 3\n");

    let config = ws.config(&ws.path("src"), r#"{"from":"val","to":"let","multiple":true}"#);
    let orchestrator = Orchestrator::prepare(config.clone()).unwrap();
    let summary = orchestrator.run().unwrap();

    let validator = Validator::new(&config.dest_root, config.reference_root.clone().unwrap());
    let clean = validator.validate(&summary.produced).unwrap();
    assert!(clean.is_clean());

    ws.write("reference/B.swift", "let c = 4\n");
    let dirty = validator.validate(&summary.produced).unwrap();
    assert_eq!(dirty.error_count(), 1);
    assert_eq!(dirty.mismatches[0].file, ws.path("dest/B.swift"));
    assert_eq!(
        dirty.mismatches[0].kind,
        MismatchKind::Line {
            line: 1,
            produced: "let c = 3".to_string(),
            reference: "let c = 4".to_string(),
        }
    );
}

#[test]
fn test_rerun_is_reproducible() {
    let ws = Workspace::new();
    ws.write("src/z/Last.kt", "x y\n");
    ws.write("src/First.kt", "y x\n");
    let rules = concat!(
        "{\"from\":\"x\",\"to\":\"y\",\"multiple\":true}\n",
        "{\"from\":\"y\",\"to\":\"z\",\"multiple\":false}\n",
    );

    let config = ws.config(&ws.path("src"), rules);
    let first = Orchestrator::prepare(config.clone()).unwrap().run().unwrap();
    let first_out = (ws.read("dest/First.swift"), ws.read("dest/z/Last.swift"));
    let second = Orchestrator::prepare(config).unwrap().run().unwrap();
    let second_out = (ws.read("dest/First.swift"), ws.read("dest/z/Last.swift"));

    assert_eq!(first.produced, second.produced);
    assert_eq!(first_out, second_out);
    assert_eq!(first_out.0, "z y\n");
    assert_eq!(first_out.1, "z y\n");
}
