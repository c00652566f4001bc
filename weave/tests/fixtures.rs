//! Runs every `tests/fixtures/**/*.toml` file through the weave pass.
//!
//! A fixture is a story written out as elements, optional compile options,
//! and what the result must look like.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use weave::{CompileDiagnostic, CompileOptions, Story, compile_story};

#[derive(Debug, Deserialize)]
struct ExpectedDiagnostic {
    /// `DiagnosticKind` variant name, e.g. `NamingCollision`.
    kind: String,

    /// Substring that must appear in the message.
    #[serde(default)]
    contains: String,

    /// `"error"` or `"warning"`. Unchecked when absent.
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    options: CompileOptions,

    story: Story,

    /// Expected `ContainerGraph::dump` of the root container.
    #[serde(default)]
    expect_dump: Option<String>,

    /// Author-written address -> expected runtime path.
    #[serde(default)]
    expect_paths: BTreeMap<String, String>,

    /// If present (even empty), diagnostic count and content are checked.
    #[serde(default)]
    expect_diagnostics: Option<Vec<ExpectedDiagnostic>>,
}

enum TestOutcome {
    Pass,
    Fail(String),
}

struct TestResult {
    path: PathBuf,
    description: Option<String>,
    outcome: TestOutcome,
}

fn run_single_fixture(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let fixture: Fixture = match toml::from_str(&content) {
        Ok(f) => f,
        Err(e) => return fail(None, format!("TOML parse error: {}", e)),
    };
    let description = fixture.description.clone();

    let mut diagnostics = Vec::new();
    let compilation = match compile_story(&fixture.story, &fixture.options, &mut diagnostics) {
        Ok(c) => c,
        Err(e) => return fail(description, format!("weave pass failed: {}", e)),
    };

    if let Some(expected) = &fixture.expect_dump {
        let actual = compilation.graph.dump(compilation.root);
        if actual.trim_end() != expected.trim_end() {
            return fail(
                description,
                format!("dump mismatch\n--- expected\n{}\n--- actual\n{}", expected, actual),
            );
        }
    }

    for (target, expected) in &fixture.expect_paths {
        let actual = compilation.path_of(target).map(|p| p.to_string());
        if actual.as_deref() != Some(expected.as_str()) {
            return fail(
                description,
                format!("path of '{}': expected {}, got {:?}", target, expected, actual),
            );
        }
    }

    if let Some(expected) = &fixture.expect_diagnostics {
        if let Some(reason) = check_diagnostics(&diagnostics, expected) {
            return fail(description, reason);
        }
    }

    TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Pass,
    }
}

/// Returns `Some(reason)` on mismatch. Diagnostics are compared in the
/// order they were reported.
fn check_diagnostics(
    actual: &[CompileDiagnostic],
    expected: &[ExpectedDiagnostic],
) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual
            .iter()
            .map(|d| format!("  - {:?}: {}", d.kind, d))
            .collect();
        return Some(format!(
            "expected {} diagnostic(s), got {}\n  actual diagnostics:\n{}",
            expected.len(),
            actual.len(),
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected.iter()).enumerate() {
        let kind = format!("{:?}", actual.kind);
        if kind != expected.kind {
            return Some(format!(
                "diagnostic[{}]: expected kind {}, got {}",
                i, expected.kind, kind
            ));
        }

        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "diagnostic[{}]: expected message containing \"{}\", got: {}",
                i, expected.contains, actual.message
            ));
        }

        let severity_ok = match expected.severity.as_deref() {
            None => true,
            Some("error") => actual.is_error(),
            Some("warning") => actual.is_warning(),
            Some(other) => {
                return Some(format!("diagnostic[{}]: unknown severity \"{}\"", i, other));
            }
        };
        if !severity_ok {
            return Some(format!(
                "diagnostic[{}]: expected {}, got {:?}",
                i,
                expected.severity.as_deref().unwrap_or_default(),
                actual.severity
            ));
        }
    }

    None
}

fn collect_fixtures(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_fixtures(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            out.push(path);
        }
    }
}

#[test]
fn fixtures() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut paths = Vec::new();
    collect_fixtures(&root, &mut paths);
    paths.sort();
    assert!(!paths.is_empty(), "no fixtures found in {}", root.display());

    let mut failures = Vec::new();
    for path in &paths {
        let result = run_single_fixture(path);
        let label = result
            .description
            .clone()
            .unwrap_or_else(|| result.path.display().to_string());
        match result.outcome {
            TestOutcome::Pass => eprintln!("PASS {}", label),
            TestOutcome::Fail(reason) => {
                eprintln!("FAIL {}\n  {}", label, reason);
                failures.push(format!("{}: {}", result.path.display(), reason));
            }
        }
    }

    assert!(
        failures.is_empty(),
        "{} of {} fixture(s) failed:\n{}",
        failures.len(),
        paths.len(),
        failures.join("\n")
    );
}
