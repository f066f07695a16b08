use std::{fs, path::PathBuf};

use tempfile::tempdir;

use beamline_cli::{Args, Format, LatticeDocument, View, run};

/// Collects all .toml files from a directory
fn collect_lattice_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    files.sort();
    files
}

/// Demo lattices live at the workspace root, not in the crate
fn demos_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

fn args(input: &PathBuf, output: PathBuf, view: View, slice: bool, format: Format) -> Args {
    Args {
        input: input.to_string_lossy().to_string(),
        output: Some(output.to_string_lossy().to_string()),
        config: None,
        view,
        slice,
        format,
        log_level: "off".to_string(),
    }
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_lattice_files(demos_path());

    assert!(!demos.is_empty(), "No demo lattices found in demos/");

    let mut failed = Vec::new();

    for demo in &demos {
        let stem = demo.file_stem().unwrap().to_string_lossy().to_string();
        for (view, slice, format) in [
            (View::Sequence, false, Format::Table),
            (View::Line, false, Format::Table),
            (View::Sequence, true, Format::Table),
            (View::Line, true, Format::Toml),
        ] {
            let output = temp_dir
                .path()
                .join(format!("{stem}_{view:?}_{slice}.out"));
            if let Err(e) = run(&args(demo, output, view, slice, format)) {
                failed.push((demo.clone(), e));
            }
        }
    }

    if !failed.is_empty() {
        eprintln!("\nDemos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} demo run(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let demos = collect_lattice_files(demos_path().join("errors"));

    assert!(!demos.is_empty(), "No error demos found in demos/errors/");

    let mut unexpectedly_succeeded = Vec::new();

    for demo in &demos {
        let output = temp_dir.path().join("error.out");
        if run(&args(demo, output, View::Sequence, false, Format::Table)).is_ok() {
            unexpectedly_succeeded.push(demo.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}

#[test]
fn e2e_thin_line_document_reads_back() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let input = demos_path().join("line.toml");
    let output = temp_dir.path().join("thin.toml");

    run(&args(&input, output.clone(), View::Line, true, Format::Toml)).expect("demo runs");

    let text = fs::read_to_string(&output).expect("output written");
    let document = LatticeDocument::parse(&text).expect("output is a valid document");
    assert!(document.line.iter().any(|name| name == "acs..2"));
    assert!(document.line.iter().all(|name| name != "acs"));

    let reread = temp_dir.path().join("reread.txt");
    run(&args(&output, reread.clone(), View::Sequence, false, Format::Table))
        .expect("written document runs");
    assert!(fs::read_to_string(reread).expect("written").contains("thin_rf_multipole"));
}
