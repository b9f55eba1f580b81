//! End-to-end builds of the example project under `fixtures/site`.

use sitegen::build::{build_site, clean};
use sitegen::config::{BuildKind, Config};
use sitegen::util::copy_dir;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir(&fixtures, tmp.path()).unwrap();
    tmp
}

/// Every file under `dir`, keyed by its path relative to `dir`.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(dir).unwrap().to_owned();
            (rel, fs::read(entry.path()).unwrap())
        })
        .collect()
}

#[test]
fn test_site_layout() {
    let tmp = project();
    let config = Config::from_directory(tmp.path(), BuildKind::Production).unwrap();

    build_site(&config).unwrap();

    let files: Vec<String> = snapshot(&tmp.path().join("site"))
        .keys()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    assert_eq!(
        vec![
            "about.html",
            "blog.html",
            "greet.html",
            "index.html",
            "meta.html",
            "posts/hello-world/hello.html",
            "posts/hello-world/static/thumb.svg",
            "posts/no-assets/notes.html",
            "posts/older/older.html",
            "projects.html",
            "projects/engine/engine.html",
            "projects/engine/static/diagram.svg",
            "rust.html",
            "static/style.css",
        ],
        files
    );
}

#[test]
fn test_rebuild_is_identical() {
    let tmp = project();
    let config = Config::from_directory(tmp.path(), BuildKind::Production).unwrap();

    build_site(&config).unwrap();
    let first = snapshot(&config.output_directory);
    clean(&config.output_directory).unwrap();
    assert!(!config.output_directory.exists());
    build_site(&config).unwrap();

    assert_eq!(first, snapshot(&config.output_directory));
}

#[test]
fn test_tag_pages_partition_items() {
    let tmp = project();
    let config = Config::from_directory(tmp.path(), BuildKind::Production).unwrap();

    build_site(&config).unwrap();

    let page = |name: &str| fs::read_to_string(config.output_directory.join(name)).unwrap();
    let greet = page("greet.html");
    assert!(greet.contains("posts/hello-world/hello.html"));
    assert!(!greet.contains("posts/older/older.html"));

    let rust = page("rust.html");
    let notes = rust.find("posts/no-assets/notes.html").unwrap();
    let older = rust.find("posts/older/older.html").unwrap();
    let engine = rust.find("projects/engine/engine.html").unwrap();
    assert!(notes < older && older < engine, "{}", rust);
    assert!(rust.contains("<title>rust - Example Site</title>"));

    let blog = page("blog.html");
    assert!(!blog.contains("projects/engine/engine.html"));
    assert!(blog.contains("Ada Lovelace, Charles Babbage, and Luigi Menabrea"));
    let projects = page("projects.html");
    assert!(projects.contains("projects/engine/engine.html"));
    assert!(!projects.contains("posts/hello-world/hello.html"));
}

#[test]
fn test_test_profile_skips_projects() {
    let tmp = project();
    let config = Config::from_directory(tmp.path(), BuildKind::Test).unwrap();

    build_site(&config).unwrap();

    let site = tmp.path().join("test-site");
    assert!(site.join("posts/hello-world/hello.html").is_file());
    assert!(!site.join("projects").exists());
    assert!(!site.join("projects.html").exists());
    assert!(!tmp.path().join("site").exists());
}

#[test]
fn test_output_directory_over_project_is_rejected() {
    let tmp = project();
    let project_file = tmp.path().join("sitegen.yaml");
    let text = fs::read_to_string(&project_file).unwrap();
    fs::write(
        &project_file,
        text.replace("output_directory: site\n", "output_directory: .\n"),
    )
    .unwrap();

    assert!(Config::from_directory(tmp.path(), BuildKind::Production).is_err());
    assert!(project_file.is_file());
    assert!(tmp.path().join("posts/hello-world/post.json").is_file());
}
