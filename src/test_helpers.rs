use crate::parser::{parse_record, POST_DESCRIPTOR, PROJECT_DESCRIPTOR};
use crate::post::{BuildArtifact, ContentRecord};
use crate::template::Templates;
use crate::util::copy_dir;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The checked-in example project.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site")
}

/// Copies the example project into a fresh temp dir so tests can build into
/// and mutate it.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    copy_dir(&fixtures_dir(), tmp.path()).unwrap();
    tmp
}

/// The example project's theme.
pub fn templates() -> Templates {
    Templates::load(&fixtures_dir().join("templates")).unwrap()
}

/// Loads the record for the item directory `rel` (e.g., `posts/hello`) under
/// `root`, whichever descriptor it has.
pub fn load_fixture_record(root: &Path, rel: &str) -> ContentRecord {
    let dir = root.join(rel);
    let post = dir.join(POST_DESCRIPTOR);
    match post.exists() {
        true => parse_record(&post).unwrap(),
        false => parse_record(&dir.join(PROJECT_DESCRIPTOR)).unwrap(),
    }
}

/// An already-written post. The title lowercased serves as the directory,
/// the file stem, and the link path.
pub fn artifact(title: &str, (year, month, day): (i32, u32, u32), tags: &[&str]) -> BuildArtifact {
    let id = title.to_lowercase();
    let record = ContentRecord {
        path: PathBuf::from(format!("{}.md", id)),
        directory: PathBuf::from(&id),
        format: String::from("markdown"),
        static_dir: None,
        title: title.to_owned(),
        authors: vec![String::from("Ada Lovelace")],
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
        description: format!("About {}", title),
        thumbnail: PathBuf::from("thumb.png"),
        projects: Vec::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };
    let directory = PathBuf::from("site/posts").join(&id);
    BuildArtifact {
        path: directory.join(format!("{}.html", id)),
        directory,
        link: format!("posts/{}/{}.html", id, id),
        thumbnail_link: format!("posts/{}/thumb.png", id),
        record,
    }
}
