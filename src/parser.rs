//! Defines the [`Parser`] (the collector) and [`parse_record`] (the metadata
//! loader), which turn descriptor files on disk into [`ContentRecord`]s.
//!
//! Each content item lives in its own directory one level below a content
//! root and is described by a JSON descriptor:
//!
//! ```json
//! {
//!     "file_path": "hello.md",
//!     "post_dir": "hello",
//!     "format": "markdown",
//!     "static_dir": "static",
//!     "title": "Hello, world!",
//!     "authors": ["Ada Lovelace"],
//!     "day": 3,
//!     "month": 4,
//!     "year": 2024,
//!     "description": "A first post.",
//!     "thumbnail": "static/thumb.png",
//!     "project": [],
//!     "tags": ["greet"]
//! }
//! ```

use std::{
    fmt,
    fs::read_dir,
    io,
    path::{Component, Path, PathBuf},
};

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::post::ContentRecord;
use crate::tag::Tag;

/// The descriptor file name for posts.
pub const POST_DESCRIPTOR: &str = "post.json";

/// The descriptor file name for projects.
pub const PROJECT_DESCRIPTOR: &str = "project.json";

/// Collects [`ContentRecord`]s from a content root.
pub struct Parser<'a> {
    /// The descriptor file name each item directory must contain (e.g.,
    /// [`POST_DESCRIPTOR`]).
    descriptor: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(descriptor: &'a str) -> Parser<'a> {
        Parser { descriptor }
    }

    /// Enumerates `{root}/*/{descriptor}` and loads a record from each. The
    /// result is sorted by item directory so that builds are reproducible,
    /// but callers needing a meaningful order must sort explicitly.
    ///
    /// A missing `root` is an [`Error::NotFound`]; subdirectories without a
    /// descriptor are skipped.
    pub fn collect(&self, root: &Path) -> Result<Vec<ContentRecord>> {
        let entries = match read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(root.to_owned()))
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut descriptors = Vec::new();
        for result in entries {
            let entry = result?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let descriptor = entry.path().join(self.descriptor);
            if descriptor.is_file() {
                descriptors.push((entry.file_name(), descriptor));
            } else {
                debug!(
                    "Skipping `{}`: no `{}`",
                    entry.path().display(),
                    self.descriptor
                );
            }
        }
        descriptors.sort();

        let mut records = Vec::with_capacity(descriptors.len());
        for (dir_name, descriptor) in descriptors {
            let record = parse_record(&descriptor)?;
            if record.directory.as_os_str() != dir_name.as_os_str() {
                warn!(
                    "`{}` declares post_dir `{}` but lives in `{}`",
                    descriptor.display(),
                    record.directory.display(),
                    dir_name.to_string_lossy(),
                );
            }
            records.push(record);
        }
        debug!("Collected {} records from `{}`", records.len(), root.display());
        Ok(records)
    }
}

/// Loads a single [`ContentRecord`] from the descriptor file at `path`.
pub fn parse_record(path: &Path) -> Result<ContentRecord> {
    let annotate =
        |e: Error| Error::Annotated(format!("parsing `{}`", path.display()), Box::new(e));
    let input = match std::fs::read_to_string(path) {
        Ok(input) => input,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(path.to_owned()))
        }
        Err(e) => return Err(annotate(Error::Io(e))),
    };
    parse_descriptor(&input).map_err(annotate)
}

/// Parses and validates descriptor JSON.
pub fn parse_descriptor(input: &str) -> Result<ContentRecord> {
    let descriptor: Descriptor = serde_json::from_str(input)?;

    let date = NaiveDate::from_ymd_opt(descriptor.year, descriptor.month, descriptor.day)
        .ok_or_else(|| {
            Error::Validation(format!(
                "invalid date {:04}-{:02}-{:02}",
                descriptor.year, descriptor.month, descriptor.day
            ))
        })?;

    if descriptor.authors.is_empty() {
        return Err(Error::Validation("no authors provided".to_owned()));
    }

    if !is_single_component(&descriptor.post_dir) {
        return Err(Error::Validation(format!(
            "post_dir must be a single directory name: {:?}",
            descriptor.post_dir
        )));
    }

    if descriptor.file_path.is_absolute() || descriptor.file_path.file_stem().is_none() {
        return Err(Error::Validation(format!(
            "file_path must name a file relative to post_dir: {:?}",
            descriptor.file_path
        )));
    }

    if descriptor.thumbnail.has_root() {
        return Err(Error::Validation(format!(
            "thumbnail must be relative to post_dir: {:?}",
            descriptor.thumbnail
        )));
    }

    // Tag pages are named after the slug.
    if let Some(tag) = descriptor.tags.iter().find(|t| Tag::new(t.as_str()).slug.is_empty()) {
        return Err(Error::Validation(format!(
            "tag {:?} has no letters or digits to name its page",
            tag
        )));
    }

    Ok(ContentRecord {
        path: descriptor.file_path,
        directory: descriptor.post_dir,
        format: descriptor.format,
        static_dir: descriptor.static_dir,
        title: descriptor.title,
        authors: descriptor.authors,
        date,
        description: descriptor.description,
        thumbnail: descriptor.thumbnail,
        projects: descriptor.project,
        tags: descriptor.tags,
    })
}

fn is_single_component(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// The on-disk shape of a descriptor file.
#[derive(Deserialize)]
struct Descriptor {
    file_path: PathBuf,
    post_dir: PathBuf,
    format: String,
    #[serde(default)]
    static_dir: Option<PathBuf>,
    title: String,
    authors: Vec<String>,
    day: u32,
    month: u32,
    year: i32,
    description: String,
    thumbnail: PathBuf,
    project: Vec<String>,
    tags: Vec<String>,
}

/// Represents the result of a collect or load operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`ContentRecord`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a descriptor is well-formed JSON but its contents are
    /// invalid (bad date, empty author list, unsafe paths).
    Validation(String),

    /// Returned when a descriptor is malformed or missing a required field.
    DeserializeJson(serde_json::Error),

    /// Returned when the content root or a descriptor doesn't exist.
    NotFound(PathBuf),

    /// Returned for other I/O errors.
    Io(io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl Error {
    /// Strips annotations, returning the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Annotated(_, err) => err.root(),
            _ => self,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(reason) => write!(f, "invalid descriptor: {}", reason),
            Error::DeserializeJson(err) => write!(f, "invalid descriptor: {}", err),
            Error::NotFound(path) => write!(f, "`{}` not found", path.display()),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(_) => None,
            Error::DeserializeJson(err) => Some(err),
            Error::NotFound(_) => None,
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for Error {
    /// Converts a [`serde_json::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_json`] deserialization functions.
    fn from(err: serde_json::Error) -> Error {
        Error::DeserializeJson(err)
    }
}

impl From<io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for fallible I/O functions.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}
