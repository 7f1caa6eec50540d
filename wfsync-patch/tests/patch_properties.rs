//! Behavioural tests for `wfsync_patch::apply` against realistic workflow text.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_yaml::Value;
use wfsync_core::{FormatOptions, Override, UpdateEntry};
use wfsync_patch::{apply, apply_overrides, PatchError};

const WORKFLOW: &str = r#"# Build and test the workspace
name: build-and-test

on:
  pull_request:
    types: [opened, synchronize]
  workflow_dispatch:

concurrency:
  group: ${{ github.workflow }}-${{ github.ref }}
  cancel-in-progress: true

jobs:
  build:
    runs-on: [self-hosted, linux, X64] # upstream runners
    container: ${{ matrix.container }}
    strategy:
      fail-fast: false
      matrix:
        rosdistro:
          - humble
    steps:
      - name: Check out repository
        uses: actions/checkout@v4
        with:
          fetch-depth: 1

      - name: Build
        run: |
          colcon build --event-handlers console_cohesion+ \
            --cmake-args -DCMAKE_BUILD_TYPE=Release

  # Runs only on the upstream repository
  clang-tidy:
    runs-on: 'ubuntu-latest'
    steps:
      - uses: actions/checkout@v4
"#;

fn updates(yaml: &str) -> Vec<UpdateEntry> {
    serde_yaml::from_str(yaml).expect("updates list")
}

fn patch(original: &str, yaml: &str) -> String {
    apply(original, &updates(yaml), &FormatOptions::default())
        .expect("apply")
        .render()
}

// ---------------------------------------------------------------------------
// Formatting preservation
// ---------------------------------------------------------------------------

#[test]
fn zero_overrides_reproduce_input_exactly() {
    let doc = apply(WORKFLOW, &[], &FormatOptions::default()).unwrap();
    assert_eq!(doc.render(), WORKFLOW);
}

#[test]
fn overrides_touch_only_their_lines() {
    let out = patch(
        WORKFLOW,
        r#"
- jobs.build.runs-on: ubuntu-22.04
- "jobs.build.container: ${{ matrix.image }}"
- jobs.build.timeout-minutes: 60
"#,
    );
    let expected = WORKFLOW
        .replace(
            "    runs-on: [self-hosted, linux, X64] # upstream runners\n",
            "    runs-on: ubuntu-22.04\n",
        )
        .replace(
            "    container: ${{ matrix.container }}\n",
            "    container: ${{ matrix.image }}\n",
        )
        .replace(
            "            --cmake-args -DCMAKE_BUILD_TYPE=Release\n",
            "            --cmake-args -DCMAKE_BUILD_TYPE=Release\n    timeout-minutes: 60\n",
        );
    assert_eq!(out, expected);
}

#[test]
fn quoting_of_untouched_siblings_is_kept() {
    let out = patch(WORKFLOW, "- jobs.clang-tidy.timeout-minutes: 10\n");
    assert!(out.contains("    runs-on: 'ubuntu-latest'\n"));
    assert!(out.ends_with("      - uses: actions/checkout@v4\n    timeout-minutes: 10\n"));
}

// ---------------------------------------------------------------------------
// Idempotence and ordering
// ---------------------------------------------------------------------------

const UPDATES: &str = r#"
- jobs.build.runs-on: ubuntu-22.04
- "jobs.build.env.CCACHE_DIR: /tmp/ccache"
- jobs.deploy.if: ${{ github.event_name == 'push' }}
- "jobs.build.strategy.matrix.rosdistro: ['humble', 'jazzy']"
"#;

#[test]
fn applying_twice_to_original_is_deterministic() {
    assert_eq!(patch(WORKFLOW, UPDATES), patch(WORKFLOW, UPDATES));
}

#[test]
fn reapplying_to_patched_output_is_a_no_op() {
    let once = patch(WORKFLOW, UPDATES);
    let twice = patch(&once, UPDATES);
    assert_eq!(twice, once);
}

#[test]
fn parsed_overrides_apply_like_update_entries() {
    let overrides = [
        Override::new("jobs.build.runs-on", "ubuntu-22.04").unwrap(),
        Override::new("jobs.build.timeout-minutes", "30").unwrap(),
    ];
    let doc = apply_overrides(
        "jobs:\n  build:\n    runs-on: a\n",
        &overrides,
        &FormatOptions::default(),
    )
    .unwrap();
    assert_eq!(
        doc.render(),
        patch(
            "jobs:\n  build:\n    runs-on: a\n",
            "- jobs.build.runs-on: ubuntu-22.04\n- jobs.build.timeout-minutes: 30\n"
        )
    );
    assert_eq!(
        doc.to_value().unwrap()["jobs"]["build"]["timeout-minutes"],
        Value::Number(30.into())
    );
}

#[test]
fn later_override_on_same_path_wins() {
    let out = patch(
        "jobs:\n  build:\n    runs-on: a\n",
        "- jobs.build.runs-on: first\n- 'jobs.build.runs-on: second'\n",
    );
    assert_eq!(out, "jobs:\n  build:\n    runs-on: second\n");
}

// ---------------------------------------------------------------------------
// Path creation
// ---------------------------------------------------------------------------

#[test]
fn missing_path_is_created_from_empty_mapping() {
    let doc = apply("{}", &updates("- a.b.c: x\n"), &FormatOptions::default()).unwrap();
    let value = doc.to_value().unwrap();
    let expected: Value = serde_yaml::from_str("a:\n  b:\n    c: x\n").unwrap();
    assert_eq!(value, expected);
    assert_eq!(doc.render(), "a:\n  b:\n    c: x");
}

#[test]
fn new_intermediate_levels_use_mapping_indent() {
    let out = patch("name: ci\n", "- on.push.branches: '[main]'\n");
    assert_eq!(out, "name: ci\non:\n  push:\n    branches:\n      - main\n");
}

#[test]
fn unquoted_flow_text_replaces_inline_collection_in_block_style() {
    let doc = apply(
        "on:\n  pull_request:\n    types: [opened] # upstream\n",
        &updates("- on.pull_request.types: '[opened, synchronize]'\n"),
        &FormatOptions::default(),
    )
    .unwrap();
    assert_eq!(
        doc.render(),
        "on:\n  pull_request:\n    types:\n      - opened\n      - synchronize\n"
    );
    let expected: Value = serde_yaml::from_str("[opened, synchronize]").unwrap();
    assert_eq!(doc.to_value().unwrap()["on"]["pull_request"]["types"], expected);
}

// ---------------------------------------------------------------------------
// Scalar style inference
// ---------------------------------------------------------------------------

#[rstest]
#[case("- k: ubuntu-22.04\n", "k: ubuntu-22.04\n")]
#[case("- 'k: ${{ matrix.os }}'\n", "k: ${{ matrix.os }}\n")]
#[case("- k: ${{ inputs.runner || 'ubuntu-22.04' }}\n", "k: ${{ inputs.runner || 'ubuntu-22.04' }}\n")]
#[case("- \"k: 'quoted text'\"\n", "k: quoted text\n")]
#[case("- \"k: 'false'\"\n", "k: 'false'\n")]
#[case("- \"k: ['a', 'b']\"\n", "k:\n  - a\n  - b\n")]
#[case("- k: ''\n", "k:\n")]
fn value_rendering(#[case] update: &str, #[case] expected: &str) {
    assert_eq!(patch("k: old\n", update), expected);
}

#[test]
fn boolean_looking_text_round_trips_as_boolean() {
    let doc = apply(
        "jobs:\n  build:\n    continue-on-error: false\n",
        &updates("- jobs.build.continue-on-error: \"true\"\n"),
        &FormatOptions::default(),
    )
    .unwrap();
    assert_eq!(doc.render(), "jobs:\n  build:\n    continue-on-error: true\n");
    let value = doc.to_value().unwrap();
    assert_eq!(value["jobs"]["build"]["continue-on-error"], Value::Bool(true));
}

#[test]
fn quoted_false_round_trips_as_string() {
    let doc = apply(
        "env:\n  FLAG: x\n",
        &updates("- \"env.FLAG: 'false'\"\n"),
        &FormatOptions::default(),
    )
    .unwrap();
    assert_eq!(
        doc.to_value().unwrap()["env"]["FLAG"],
        Value::String("false".into())
    );
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[test]
fn malformed_override_is_skipped_and_rest_applied() {
    let out = patch(
        "a: 1\nb: 2\n",
        "- no separator here\n- 42\n- 'b: 3'\n",
    );
    assert_eq!(out, "a: 1\nb: 3\n");
}

#[test]
fn override_through_scalar_is_skipped() {
    let out = patch("a: 1\nb: 2\n", "- a.x: 5\n- b: 7\n");
    assert_eq!(out, "a: 1\nb: 7\n");
}

#[rstest]
#[case("")]
#[case("   \n")]
#[case("# just a comment\n")]
fn empty_content_is_an_error(#[case] original: &str) {
    let err = apply(original, &[], &FormatOptions::default()).unwrap_err();
    assert!(matches!(err, PatchError::Empty), "got: {err}");
}

#[test]
fn unparsable_content_is_an_error() {
    let err = apply("jobs: [unclosed\n", &[], &FormatOptions::default()).unwrap_err();
    assert!(matches!(err, PatchError::Parse(_)), "got: {err}");
}
