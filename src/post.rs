//! Defines the in-memory data model that flows through the build: a
//! [`ContentRecord`] is parsed from each descriptor file, paired with its
//! converted body as a [`RenderedContent`], and finally recorded as a
//! [`BuildArtifact`] once its page has been written to disk.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// One post or project as described by its descriptor file. Records are
/// constructed once by [`crate::parser`] and never mutated afterward.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentRecord {
    /// The markup source file, relative to [`ContentRecord::directory`].
    pub path: PathBuf,

    /// The item's directory relative to the content root. This is always a
    /// single path component and doubles as the item's identifier.
    pub directory: PathBuf,

    /// The markup format tag handed to the markup converter (e.g.,
    /// `markdown`).
    pub format: String,

    /// The static-asset subdirectory relative to
    /// [`ContentRecord::directory`], if the item has one.
    pub static_dir: Option<PathBuf>,

    pub title: String,

    /// Never empty.
    pub authors: Vec<String>,

    pub date: NaiveDate,

    pub description: String,

    /// The thumbnail image, relative to the item's output directory.
    pub thumbnail: PathBuf,

    /// Identifiers of the projects this item belongs to.
    pub projects: Vec<String>,

    pub tags: Vec<String>,
}

impl ContentRecord {
    /// The item's identifier, which is also the name of its output directory.
    pub fn id(&self) -> String {
        self.directory.to_string_lossy().into_owned()
    }

    /// The file stem of the markup source; the item's page is written as
    /// `{stem}.html`.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.id())
    }

    /// The markup source file relative to the content root.
    pub fn source_path(&self, content_root: &Path) -> PathBuf {
        content_root.join(&self.directory).join(&self.path)
    }
}

/// A [`ContentRecord`] paired with its body converted to HTML.
#[derive(Clone, Debug)]
pub struct RenderedContent {
    pub record: ContentRecord,
    pub html: String,
}

/// A [`ContentRecord`] whose page has been written to disk.
#[derive(Clone, Debug)]
pub struct BuildArtifact {
    /// The written HTML file.
    pub path: PathBuf,

    /// The directory containing [`BuildArtifact::path`]. Static assets are
    /// copied into `{directory}/static`.
    pub directory: PathBuf,

    /// The page's link relative to the site root (e.g.,
    /// `posts/hello/hello.html`).
    pub link: String,

    /// The thumbnail's link relative to the site root.
    pub thumbnail_link: String,

    pub record: ContentRecord,
}
