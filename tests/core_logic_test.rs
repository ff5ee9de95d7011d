use amalgamate::builders::writer::OutputTarget;
use amalgamate::core::config::{AmalgamateConfig, ConfigManager, Invocation, ProjectConfig};
use amalgamate::core::error::AmalgamateError;
use amalgamate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn setup_project() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_path_buf();

    fs::create_dir_all(root.join("include/lib")).unwrap();
    fs::write(
        root.join("include/lib/lib.hpp"),
        "#pragma once\n#include <string>\n#include \"lib/detail.hpp\"\nnamespace lib {}\n",
    )
    .unwrap();
    fs::write(
        root.join("include/lib/detail.hpp"),
        "#pragma once\nnamespace lib::detail {}\n",
    )
    .unwrap();

    (dir, root)
}

fn invocation(root: &Path) -> Invocation {
    Invocation {
        files: vec![root.join("include/lib/lib.hpp")],
        incdirs: vec![root.join("include")],
        ..Default::default()
    }
}

#[test]
fn test_sibling_output_with_preamble() {
    let (_td, root) = setup_project();
    fs::write(
        root.join("preamble.txt"),
        "// @PROJECT@ @VERSION@ -- @URL@\n",
    )
    .unwrap();

    let mut inv = invocation(&root);
    inv.preamble = Some(root.join("preamble.txt"));
    inv.project_name = Some("lib".to_string());
    inv.project_version = Some("1.2.3".to_string());
    inv.project_url = Some("https://example.org/lib".to_string());

    let config = AmalgamateConfig::resolve(inv, ProjectConfig::default()).unwrap();
    let report = utils::run(&config).unwrap();

    let output = root.join("include/lib/lib.hpp.amalgamated");
    assert_eq!(report.total_outputs(), 1);
    assert_eq!(
        fs::read_to_string(output).unwrap(),
        "// lib 1.2.3 -- https://example.org/lib\n\
         // #pragma once\n\
         #include <string>\n\
         // #include \"lib/detail.hpp\"\n\
         // #pragma once\n\
         namespace lib::detail {}\n\
         namespace lib {}\n"
    );
    assert_eq!(report.roots[0].stats.unresolved, vec!["string"]);
}

#[test]
fn test_fan_out_to_every_directory() {
    let (_td, root) = setup_project();
    let outdirs = vec![root.join("dist/a"), root.join("dist/b"), root.join("dist/c")];

    let mut inv = invocation(&root);
    inv.outdirs = outdirs.clone();
    inv.ext = Some("ignored".to_string());

    let config = AmalgamateConfig::resolve(inv, ProjectConfig::default()).unwrap();
    assert_eq!(config.target, OutputTarget::Directories(outdirs.clone()));
    utils::run(&config).unwrap();

    let contents: Vec<String> = outdirs
        .iter()
        .map(|dir| fs::read_to_string(dir.join("lib.hpp")).unwrap())
        .collect();
    assert!(contents.iter().all(|c| c == &contents[0]));
    assert!(contents[0].contains("namespace lib::detail {}"));
    assert!(!root.join("include/lib/lib.hpp.ignored").exists());
    for dir in &outdirs {
        assert_eq!(fs::read_dir(dir).unwrap().count(), 1);
    }
}

#[test]
fn test_dry_run_writes_nothing() {
    let (_td, root) = setup_project();
    let mut inv = invocation(&root);
    inv.dry_run = true;

    let config = AmalgamateConfig::resolve(inv, ProjectConfig::default()).unwrap();
    let report = utils::run(&config).unwrap();

    assert_eq!(report.roots[0].destinations.len(), 1);
    assert!(!report.roots[0].destinations[0].exists());
}

#[test]
fn test_config_file_supplies_defaults() {
    let (_td, root) = setup_project();
    let config_path = root.join("amalgamate.yaml");
    let manager = ConfigManager::new(config_path.clone());
    let mut project = ProjectConfig::template();
    project.amalgamate.incdirs = vec![root.join("include")];
    project.amalgamate.ext = Some("single.hpp".to_string());
    manager.save_config(&project).unwrap();

    let inv = Invocation {
        files: vec![root.join("include/lib/lib.hpp")],
        config: Some(config_path),
        ..Default::default()
    };
    let file_config = ConfigManager::load_for(&inv).unwrap();
    let config = AmalgamateConfig::resolve(inv, file_config).unwrap();
    utils::run(&config).unwrap();

    let output = fs::read_to_string(root.join("include/lib/lib.hpp.single.hpp")).unwrap();
    assert!(output.contains("// #include \"lib/detail.hpp\""));
}

#[test]
fn test_malformed_invocations_are_rejected_before_processing() {
    let (_td, root) = setup_project();

    let empty = Invocation {
        incdirs: vec![root.join("include")],
        ..Default::default()
    };
    let config = AmalgamateConfig::resolve(empty, ProjectConfig::default()).unwrap();
    let err = utils::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AmalgamateError>(),
        Some(AmalgamateError::NoInputFiles)
    ));

    let mut missing = invocation(&root);
    missing.files.push(root.join("include/lib/nope.hpp"));
    let config = AmalgamateConfig::resolve(missing, ProjectConfig::default()).unwrap();
    let err = utils::run(&config).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AmalgamateError>(),
        Some(AmalgamateError::InvalidInvocation(_))
    ));
    assert!(!root.join("include/lib/lib.hpp.amalgamated").exists());
}

#[test]
fn test_unreadable_include_fails_the_run() {
    let (_td, root) = setup_project();
    // Resolves fine, but is not valid UTF-8 text.
    fs::write(root.join("include/lib/detail.hpp"), [0xff, 0xfe, 0x00]).unwrap();

    let config = AmalgamateConfig::resolve(invocation(&root), ProjectConfig::default()).unwrap();
    let err = utils::run(&config).unwrap_err();

    assert!(format!("{err:#}").contains("detail.hpp"));
    assert!(!root.join("include/lib/lib.hpp.amalgamated").exists());
}

#[test]
fn test_every_root_gets_the_preamble_and_only_its_own_expansion() {
    let (_td, root) = setup_project();
    fs::write(root.join("include/lib/other.hpp"), "#include \"lib/extra.hpp\"\nint other;\n").unwrap();
    fs::write(root.join("include/lib/extra.hpp"), "int extra;\n").unwrap();
    fs::write(root.join("preamble.txt"), "// @PROJECT@ @VERSION@").unwrap();

    let mut inv = invocation(&root);
    inv.files.push(root.join("include/lib/other.hpp"));
    inv.outdirs = vec![root.join("dist")];
    inv.preamble = Some(root.join("preamble.txt"));
    inv.project_name = Some("lib".to_string());
    inv.project_version = Some("2.0".to_string());

    let config = AmalgamateConfig::resolve(inv, ProjectConfig::default()).unwrap();
    let report = utils::run(&config).unwrap();
    assert_eq!(report.total_outputs(), 2);

    let lib = fs::read_to_string(root.join("dist/lib.hpp")).unwrap();
    let other = fs::read_to_string(root.join("dist/other.hpp")).unwrap();

    assert!(lib.starts_with("// lib 2.0\n// #pragma once\n"));
    assert!(lib.contains("namespace lib::detail {}"));
    assert!(!lib.contains("int other;") && !lib.contains("int extra;"));

    assert_eq!(
        other,
        "// lib 2.0\n// #include \"lib/extra.hpp\"\nint extra;\nint other;\n"
    );
}

#[test]
fn test_roots_colliding_in_one_output_directory_are_rejected() {
    let (_td, root) = setup_project();
    fs::create_dir_all(root.join("other/lib")).unwrap();
    fs::write(root.join("other/lib/lib.hpp"), "int shadow;\n").unwrap();

    let mut inv = invocation(&root);
    inv.files.push(root.join("other/lib/lib.hpp"));
    inv.outdirs = vec![root.join("out")];

    let config = AmalgamateConfig::resolve(inv, ProjectConfig::default()).unwrap();
    let err = utils::run(&config).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<AmalgamateError>(),
        Some(AmalgamateError::InvalidInvocation(msg)) if msg.contains("more than one input")
    ));
    assert!(!root.join("out").exists());
}
