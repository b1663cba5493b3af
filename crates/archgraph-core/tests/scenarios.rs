//! End-to-end scenarios over definition files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use archgraph_core::error::{ArchError, ErrorCode, Violation};
use archgraph_core::graph::find_cycles;
use archgraph_core::render::{NoIcons, RenderOptions, TeamRenderOptions, render_graph, render_team_graph};
use archgraph_core::{ProjectLoader, RenderError, load_definitions};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

const CYCLE: &str = "
name: cyclic
applications:
  - id: A
    dependencies: [B]
  - id: B
    dependencies: [C]
  - id: C
    dependencies: [A]
";

const DUPLICATE: &str = "
name: dup
applications:
  - id: svc1
    summary: first
  - id: svc1
    summary: second
";

const TEAMS: &str = "
name: teams
teams:
  - name: T1
    description: Checkout
applications:
  - id: a1
    team: T1
    dependencies: [b1, b2]
  - id: a2
    team: T1
    dependencies: [b3]
  - id: b1
    team: T2
  - id: b2
    team: T2
  - id: b3
    team: T2
subviews:
  - name: t1-only
    include-teams: [T1]
";

#[test]
fn analyze_reports_single_three_node_cycle() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "cycle.yml", CYCLE);

    let loaded = ProjectLoader::strict().load(&[path], None).expect("load");
    let cycles = find_cycles(&loaded.project);
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].members.clone();
    members.sort();
    assert_eq!(members, vec!["A", "B", "C"]);
}

#[test]
fn duplicate_id_strict_fails_lenient_keeps_first() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "dup.yml", DUPLICATE);

    let err = ProjectLoader::strict()
        .load(std::slice::from_ref(&path), None)
        .expect_err("strict load must fail");
    assert_eq!(err.error_code(), ErrorCode::DuplicateApplicationId);
    assert!(err.to_string().contains("svc1"), "err: {err}");

    let loaded = ProjectLoader::lenient().load(&[path], None).expect("lenient load");
    assert_eq!(loaded.project.applications().len(), 1);
    assert_eq!(
        loaded.project.applications()[0].summary.as_deref(),
        Some("first")
    );
    assert!(matches!(
        loaded.warnings.as_slice(),
        [Violation::DuplicateApplicationId { id, .. }] if id == "svc1"
    ));
}

#[test]
fn redefinition_in_later_fragment_is_flagged() {
    let dir = TempDir::new().expect("tempdir");
    let main = write(
        dir.path(),
        "main.yml",
        "name: split\ninclude: [extra.yml]\napplications:\n  - id: svc\n",
    );
    write(dir.path(), "extra.yml", "applications:\n  - id: svc\n    summary: later\n");

    let err = ProjectLoader::strict().load(&[main], None).expect_err("duplicate");
    let ArchError::ReferentialIntegrity(integrity) = err else {
        panic!("expected integrity error");
    };
    let Some(Violation::DuplicateApplicationId { duplicate_source, .. }) = integrity.first() else {
        panic!("expected duplicate violation");
    };
    assert!(duplicate_source.ends_with("extra.yml"));
}

#[test]
fn unresolved_dependency_is_downgraded_when_lenient() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        dir.path(),
        "dangling.yml",
        "name: d\napplications:\n  - id: a\n    dependencies: [ghost]\n",
    );

    let err = ProjectLoader::strict()
        .load(std::slice::from_ref(&path), None)
        .expect_err("strict");
    assert_eq!(err.error_code(), ErrorCode::UnresolvedDependency);

    let loaded = ProjectLoader::lenient().load(&[path], None).expect("lenient");
    assert_eq!(loaded.warnings.len(), 1);
    let dot = render_graph(&loaded.project, &RenderOptions::default(), &NoIcons).expect("render");
    assert!(dot.contains("\"a\" -> \"ghost\""));
}

#[test]
fn unknown_application_graph_is_render_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "cycle.yml", CYCLE);
    let loaded = ProjectLoader::strict().load(&[path], None).expect("load");

    let options = RenderOptions {
        application: Some("Z".to_string()),
        ..RenderOptions::default()
    };
    let err = render_graph(&loaded.project, &options, &NoIcons).expect_err("render error");
    assert!(matches!(err, RenderError::UnknownApplication { ref id } if id == "Z"));

    // Earlier results stay usable.
    assert_eq!(find_cycles(&loaded.project).len(), 1);
}

#[test]
fn summarized_team_graph_has_one_edge_per_pair() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "teams.yml", TEAMS);
    let loaded = ProjectLoader::strict().load(&[path], None).expect("load");

    let dot = render_team_graph(
        &loaded.project,
        &TeamRenderOptions {
            summarize_relations: true,
            ..TeamRenderOptions::default()
        },
    );
    let edges: Vec<&str> = dot.lines().filter(|l| l.contains("->")).collect();
    assert_eq!(edges.len(), 1, "dot:\n{dot}");
    assert!(edges[0].contains("\"T1\" -> \"T2\""));
}

#[test]
fn subview_keeps_dangling_edges() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(dir.path(), "teams.yml", TEAMS);
    let def = load_definitions(&[path]).expect("definitions");

    let loaded = ProjectLoader::strict()
        .load_project(&def, Some("t1-only"))
        .expect("load");
    assert_eq!(loaded.subview.as_deref(), Some("t1-only"));
    let ids: Vec<&str> = loaded.project.applications().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert!(loaded.project.application("a1").expect("a1").depends_on("b1"));
    assert!(loaded.warnings.is_empty());

    let err = ProjectLoader::strict()
        .load_project(&def, Some("missing"))
        .expect_err("unknown subview");
    assert_eq!(err.error_code(), ErrorCode::UnknownSubView);
    assert!(err.to_string().contains("t1-only"));
}

#[test]
fn json_definitions_load() {
    let dir = TempDir::new().expect("tempdir");
    let path = write(
        dir.path(),
        "arch.json",
        r#"{"name": "j", "applications": [{"id": "a", "dependencies": [{"target": "b.rest", "relation": "api"}]}, {"id": "b"}]}"#,
    );
    let loaded = ProjectLoader::strict().load(&[path], None).expect("load");
    let a = loaded.project.application("a").expect("a");
    assert_eq!(a.dependencies[0].target, "b");
    assert_eq!(a.dependencies[0].interface.as_deref(), Some("rest"));
}
