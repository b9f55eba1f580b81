use crate::format::{render_authors_string, render_date_string, NoAuthorsError};
use crate::markdown::{self, Converter};
use crate::post::{BuildArtifact, ContentRecord, RenderedContent};
use crate::template::{self, render, Params, Templates};
use crate::util::copy_dir;
use gtmpl::Template;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The relative path from an item page (`{section}/{id}/{stem}.html`) back to
/// the site root.
pub const ITEM_DEPTH: &str = "../../";

/// Responsible for converting, templating, and writing item pages to disk
/// for one section of the site (posts or projects), and for copying each
/// item's static assets next to its page.
pub struct Writer<'a> {
    /// The parsed theme templates; supplies the header and navbar.
    pub templates: &'a Templates,

    /// The template for this section's item pages.
    pub page_template: &'a Template,

    /// Converts item bodies to HTML.
    pub converter: &'a dyn Converter,

    /// The site name, appended to every item's page title.
    pub site_name: &'a str,

    /// The section's path relative to the site root (e.g., `posts`). Item
    /// links are `{section}/{id}/{stem}.html`.
    pub section: &'a str,

    /// The content root the section's records were collected from.
    pub source_directory: &'a Path,

    /// The directory item pages are written into; each item gets its own
    /// `{output_directory}/{id}` subdirectory.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Reads an item's markup source and converts it to HTML.
    pub fn render_content(&self, record: ContentRecord) -> Result<RenderedContent> {
        let source = record.source_path(self.source_directory);
        debug!("Building {} html", source.display());
        let text = match std::fs::read_to_string(&source) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(source))
            }
            Err(err) => return Err(Error::Io { path: source, err }),
        };
        let html = self.converter.convert(&text, &record.format)?;
        Ok(RenderedContent { record, html })
    }

    /// Templates `rendered` into a full page and writes it to
    /// `{output_directory}/{id}/{stem}.html`. `extra` parameters are passed to
    /// the page template alongside the standard ones.
    pub fn write_page(&self, rendered: RenderedContent, extra: Params) -> Result<BuildArtifact> {
        let RenderedContent { record, html } = rendered;
        let params = Params::new()
            .with(
                "header",
                self.templates.header(
                    &format!("{} - {}", record.title, self.site_name),
                    ITEM_DEPTH,
                )?,
            )
            .with("navbar", self.templates.navbar(ITEM_DEPTH)?)
            .with("depth", ITEM_DEPTH)
            .with("post_title", record.title.as_str())
            .with("post_author", render_authors_string(&record.authors)?)
            .with("post_date", render_date_string(&record.date))
            .with("post_html", html)
            .merge(extra);
        let text = render(self.page_template, params)?;

        let id = record.id();
        let stem = record.stem();
        let directory = self.output_directory.join(&id);
        let path = directory.join(format!("{}.html", stem));
        debug!("Writing {} to {}", record.title, path.display());
        std::fs::create_dir_all(&directory).map_err(|err| Error::Io {
            path: directory.clone(),
            err,
        })?;
        std::fs::write(&path, text).map_err(|err| Error::Io {
            path: path.clone(),
            err,
        })?;

        Ok(BuildArtifact {
            link: format!("{}/{}/{}.html", self.section, id, stem),
            thumbnail_link: format!("{}/{}/{}", self.section, id, url_path(&record.thumbnail)),
            path,
            directory,
            record,
        })
    }

    /// Copies the item's static-asset directory to `{artifact.directory}/static`,
    /// merging into whatever is already there. Items without a static
    /// directory are left alone.
    pub fn copy_static(&self, artifact: &BuildArtifact) -> Result<()> {
        let static_dir = match &artifact.record.static_dir {
            None => return Ok(()),
            Some(static_dir) => static_dir,
        };
        let src = self
            .source_directory
            .join(&artifact.record.directory)
            .join(static_dir);
        let dst = artifact.directory.join("static");
        if !src.is_dir() {
            return Err(Error::NotFound(src));
        }
        debug!("Copying {} to {}", src.display(), dst.display());
        copy_dir(&src, &dst).map_err(|err| Error::Io { path: src, err })
    }

    /// Runs a record through the whole item pipeline: convert, template,
    /// write, copy static assets. Errors are annotated with the item.
    pub fn write_item(&self, record: ContentRecord, extra: Params) -> Result<BuildArtifact> {
        let id = record.id();
        let annotate =
            |e: Error| Error::Annotated(format!("building {} `{}`", self.section, id), Box::new(e));
        let rendered = self.render_content(record).map_err(&annotate)?;
        let artifact = self.write_page(rendered, extra).map_err(&annotate)?;
        self.copy_static(&artifact).map_err(&annotate)?;
        Ok(artifact)
    }
}

/// Joins a relative path's components with `/` for use in links.
pub fn url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error converting the item's markup.
    Markup(markdown::Error),

    /// An error during templating.
    Template(template::Error),

    /// The item has no authors.
    Authors(NoAuthorsError),

    /// The item's markup source or static directory doesn't exist.
    NotFound(PathBuf),

    /// An error reading sources or writing the output files.
    Io { path: PathBuf, err: io::Error },

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

impl From<markdown::Error> for Error {
    fn from(err: markdown::Error) -> Error {
        Error::Markup(err)
    }
}

impl From<template::Error> for Error {
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}

impl From<NoAuthorsError> for Error {
    fn from(err: NoAuthorsError) -> Error {
        Error::Authors(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Markup(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Authors(err) => err.fmt(f),
            Error::NotFound(path) => write!(f, "`{}` not found", path.display()),
            Error::Io { path, err } => write!(f, "`{}`: {}", path.display(), err),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Markup(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Authors(err) => Some(err),
            Error::NotFound(_) => None,
            Error::Io { path: _, err } => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::markdown::Markup;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        templates: Templates,
        markup: Markup,
        source_directory: PathBuf,
        output_directory: PathBuf,
    }

    impl Fixture {
        fn new() -> Fixture {
            let tmp = setup_fixtures();
            Fixture {
                source_directory: tmp.path().join("posts"),
                output_directory: tmp.path().join("site/posts"),
                tmp,
                templates: templates(),
                markup: Markup::default(),
            }
        }

        fn writer(&self) -> Writer<'_> {
            Writer {
                templates: &self.templates,
                page_template: &self.templates.post,
                converter: &self.markup,
                site_name: "Example Site",
                section: "posts",
                source_directory: &self.source_directory,
                output_directory: &self.output_directory,
            }
        }
    }

    #[test]
    fn test_write_item() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer();
        let record = load_fixture_record(fixture.tmp.path(), "posts/hello-world");

        let artifact = writer.write_item(record, Params::new())?;

        let wanted = fixture.tmp.path().join("site/posts/hello-world/hello.html");
        assert_eq!(wanted, artifact.path);
        assert_eq!(fixture.tmp.path().join("site/posts/hello-world"), artifact.directory);
        assert_eq!("posts/hello-world/hello.html", artifact.link);
        assert_eq!("posts/hello-world/static/thumb.svg", artifact.thumbnail_link);

        let page = fs::read_to_string(&wanted).map_err(|err| Error::Io { path: wanted, err })?;
        assert!(page.contains("<title>Hello, world! - Example Site</title>"), "{}", page);
        assert!(page.contains("Ada Lovelace and Charles Babbage"), "{}", page);
        assert!(page.contains("April 3, 2024"), "{}", page);
        assert!(page.contains("<h1>Hello</h1>"), "{}", page);
        assert!(page.contains(r#"href="../../static/style.css""#), "{}", page);
        assert!(artifact.directory.join("static/thumb.svg").is_file());
        Ok(())
    }

    #[test]
    fn test_no_static_dir() -> Result<()> {
        let fixture = Fixture::new();
        let record = load_fixture_record(fixture.tmp.path(), "posts/no-assets");
        assert_eq!(None, record.static_dir);

        let artifact = fixture.writer().write_item(record, Params::new())?;

        assert!(artifact.path.is_file());
        assert!(!artifact.directory.join("static").exists());
        Ok(())
    }

    #[test]
    fn test_copy_static_merges() -> Result<()> {
        let fixture = Fixture::new();
        let writer = fixture.writer();
        let record = load_fixture_record(fixture.tmp.path(), "posts/hello-world");
        let artifact = writer.write_page(writer.render_content(record)?, Params::new())?;
        let stale = artifact.directory.join("static/stale.txt");
        fs::create_dir_all(artifact.directory.join("static")).unwrap();
        fs::write(&stale, "from a previous copy").unwrap();

        writer.copy_static(&artifact)?;
        writer.copy_static(&artifact)?;

        assert!(stale.is_file());
        assert!(artifact.directory.join("static/thumb.svg").is_file());
        Ok(())
    }

    #[test]
    fn test_missing_source() {
        let fixture = Fixture::new();
        let mut record = load_fixture_record(fixture.tmp.path(), "posts/hello-world");
        record.path = PathBuf::from("missing.md");

        let err = fixture.writer().write_item(record, Params::new()).unwrap_err();
        assert!(matches!(err.root(), Error::NotFound(_)), "{:?}", err);
        assert!(err.to_string().contains("hello-world"), "{}", err);
    }

    #[test]
    fn test_unsupported_format() {
        let fixture = Fixture::new();
        let mut record = load_fixture_record(fixture.tmp.path(), "posts/hello-world");
        record.format = String::from("rst");

        let err = fixture.writer().write_item(record, Params::new()).unwrap_err();
        assert!(matches!(err.root(), Error::Markup(_)), "{:?}", err);
    }

    #[test]
    fn test_url_path() {
        assert_eq!("static/img/a.png", url_path(Path::new("static/img/a.png")));
    }
}
