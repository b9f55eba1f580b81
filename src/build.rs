//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: cleaning the previous output,
//! copying global static assets, rendering the top-level pages, running the
//! posts and projects pipelines ([`crate::parser`], [`crate::write`]), and
//! writing the listing and tag pages ([`crate::index`]).

use crate::config::Config;
use crate::index::{self, post_blocks, related_posts, Index};
use crate::markdown::{Converter, Markup};
use crate::parser::{self, Parser, POST_DESCRIPTOR, PROJECT_DESCRIPTOR};
use crate::post::BuildArtifact;
use crate::template::{self, parse_template, render, Params, Templates};
use crate::util::{copy_dir, rmdir};
use crate::write::{self, Writer, ITEM_DEPTH};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Builds the site from a [`Config`] using the default [`Markup`] converter.
pub fn build_site(config: &Config) -> Result<()> {
    build_site_with(config, &Markup::new(config.pandoc.clone()))
}

/// Builds the site from a [`Config`], converting item bodies with
/// `converter`. Any failure aborts the build; the output directory is left
/// as far as the build got.
pub fn build_site_with(config: &Config, converter: &dyn Converter) -> Result<()> {
    info!("Building site into {}", config.output_directory.display());

    // Load the theme first so a broken theme fails before anything is
    // deleted.
    let templates = Templates::load(&config.templates_directory)?;

    clean(&config.output_directory)?;
    make_build_dir(&config.output_directory)?;
    copy_static(&config.static_directory, &config.output_directory)?;
    build_pages(config, &templates)?;

    let index = Index {
        templates: &templates,
        site_name: &config.site_name,
        output_directory: &config.output_directory,
    };

    let posts = build_posts(config, &templates, converter)?;
    index.write_blog(&posts)?;

    let projects = match &config.projects_source_directory {
        Some(source_directory) => {
            let projects =
                build_projects(config, source_directory, &templates, converter, &posts)?;
            index.write_projects(&projects)?;
            projects
        }
        None => Vec::new(),
    };

    let tagged: Vec<&BuildArtifact> = posts.iter().chain(projects.iter()).collect();
    index.write_tag_pages(&tagged)?;

    info!(
        "Built {} posts and {} projects into {}",
        posts.len(),
        projects.len(),
        config.output_directory.display()
    );
    Ok(())
}

/// Deletes the build directory and everything in it. Warning: this will
/// delete everything in `build_dir`. A missing directory is not an error.
pub fn clean(build_dir: &Path) -> Result<()> {
    debug!("Cleaning {}", build_dir.display());
    rmdir(build_dir).map_err(|err| Error::Clean {
        path: build_dir.to_owned(),
        err,
    })
}

/// Makes the build directory if it doesn't already exist, replacing a file
/// of the same name.
pub fn make_build_dir(build_dir: &Path) -> Result<()> {
    if build_dir.is_dir() {
        return Ok(());
    }
    if build_dir.exists() {
        std::fs::remove_file(build_dir).map_err(|err| Error::io(build_dir, err))?;
    }
    std::fs::create_dir_all(build_dir).map_err(|err| Error::io(build_dir, err))
}

/// Copies the global static assets to `{build_dir}/static`.
pub fn copy_static(static_dir: &Path, build_dir: &Path) -> Result<()> {
    if !static_dir.is_dir() {
        return Err(Error::NotFound(static_dir.to_owned()));
    }
    let dst = build_dir.join("static");
    debug!("Copying {} to {}", static_dir.display(), dst.display());
    copy_dir(static_dir, &dst).map_err(|err| Error::io(static_dir, err))
}

/// The title of a top-level page: the site owner for `index`, otherwise the
/// capitalized file stem followed by the site name.
pub fn page_title(stem: &str, config: &Config) -> String {
    if stem == "index" {
        return config.owner.clone();
    }
    let mut chars = stem.chars();
    let capitalized: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    format!("{} - {}", capitalized, config.site_name)
}

/// Renders every `*.html` page template directly inside the pages directory
/// into the build directory.
pub fn build_pages(config: &Config, templates: &Templates) -> Result<()> {
    let mut pages: Vec<PathBuf> = Vec::new();
    let entries = match std::fs::read_dir(&config.pages_directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(config.pages_directory.clone()))
        }
        Err(err) => return Err(Error::io(&config.pages_directory, err)),
    };
    for result in entries {
        let entry = result.map_err(|err| Error::io(&config.pages_directory, err))?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "html") {
            pages.push(path);
        }
    }
    pages.sort();

    let navbar = templates.navbar("")?;
    for page in pages {
        let stem = page
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let title = page_title(&stem, config);
        let template = parse_template(&page)?;
        let text = render(
            &template,
            Params::new()
                .with("header", templates.header(&title, "")?)
                .with("navbar", navbar.as_str())
                .with("depth", ""),
        )?;
        let path = config.output_directory.join(format!("{}.html", stem));
        debug!("Writing page {} to {}", title, path.display());
        std::fs::write(&path, text).map_err(|err| Error::io(&path, err))?;
    }
    Ok(())
}

/// Runs the posts pipeline: collect, convert, write, copy static assets.
pub fn build_posts(
    config: &Config,
    templates: &Templates,
    converter: &dyn Converter,
) -> Result<Vec<BuildArtifact>> {
    let records = Parser::new(POST_DESCRIPTOR).collect(&config.posts_source_directory)?;
    info!("Collected {} posts", records.len());

    let writer = Writer {
        templates,
        page_template: &templates.post,
        converter,
        site_name: &config.site_name,
        section: "posts",
        source_directory: &config.posts_source_directory,
        output_directory: &config.posts_output_directory,
    };
    let mut posts = Vec::with_capacity(records.len());
    for record in records {
        posts.push(writer.write_item(record, Params::new())?);
    }
    Ok(posts)
}

/// Runs the projects pipeline. Each project page also lists the posts that
/// reference the project.
pub fn build_projects(
    config: &Config,
    source_directory: &Path,
    templates: &Templates,
    converter: &dyn Converter,
    posts: &[BuildArtifact],
) -> Result<Vec<BuildArtifact>> {
    let records = Parser::new(PROJECT_DESCRIPTOR).collect(source_directory)?;
    info!("Collected {} projects", records.len());

    let writer = Writer {
        templates,
        page_template: &templates.project,
        converter,
        site_name: &config.site_name,
        section: "projects",
        source_directory,
        output_directory: &config.projects_output_directory,
    };
    let mut projects = Vec::with_capacity(records.len());
    for record in records {
        let related = related_posts(&record, posts);
        let blocks = post_blocks(templates, &related, ITEM_DEPTH)?;
        projects.push(writer.write_item(record, Params::new().with("posts", blocks))?);
    }
    Ok(projects)
}

type Result<T> = std::result::Result<T, Error>;

/// Classifies a build failure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ErrorKind {
    /// A descriptor or item is malformed.
    Validation,

    /// A content root, source file, template, or static directory is
    /// missing.
    NotFound,

    /// Reading, writing, copying or deleting failed.
    Io,

    /// A template failed to parse or render.
    Template,

    /// Markup conversion failed.
    Markup,
}

/// The error type for building a site. Errors can be during parsing, writing,
/// cleaning output directories, parsing template files, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors collecting or loading descriptors.
    Parse(parser::Error),

    /// Returned for errors writing item pages to disk.
    Write(write::Error),

    /// Returned for errors writing listing and tag pages.
    Index(index::Error),

    /// Returned for errors loading or rendering templates.
    Template(template::Error),

    /// Returned for I/O problems while cleaning the output directory.
    Clean { path: PathBuf, err: io::Error },

    /// Returned when the pages or static directory doesn't exist.
    NotFound(PathBuf),

    /// Returned for other I/O errors.
    Io { path: PathBuf, err: io::Error },
}

impl Error {
    fn io(path: &Path, err: io::Error) -> Error {
        Error::Io {
            path: path.to_owned(),
            err,
        }
    }

    /// The category of the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(err) => match err.root() {
                parser::Error::Validation(_) | parser::Error::DeserializeJson(_) => {
                    ErrorKind::Validation
                }
                parser::Error::NotFound(_) => ErrorKind::NotFound,
                parser::Error::Io(_) | parser::Error::Annotated(_, _) => ErrorKind::Io,
            },
            Error::Write(err) => match err.root() {
                write::Error::Markup(_) => ErrorKind::Markup,
                write::Error::Template(err) => template_kind(err),
                write::Error::Authors(_) => ErrorKind::Validation,
                write::Error::NotFound(_) => ErrorKind::NotFound,
                write::Error::Io { .. } | write::Error::Annotated(_, _) => ErrorKind::Io,
            },
            Error::Index(err) => match err {
                index::Error::Template(err) => template_kind(err),
                index::Error::Authors(_)
                | index::Error::TagCollision { .. }
                | index::Error::PageCollision(_) => ErrorKind::Validation,
                index::Error::Io { .. } => ErrorKind::Io,
            },
            Error::Template(err) => template_kind(err),
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Clean { .. } | Error::Io { .. } => ErrorKind::Io,
        }
    }
}

fn template_kind(err: &template::Error) -> ErrorKind {
    match err {
        template::Error::NotFound(_) => ErrorKind::NotFound,
        template::Error::OpenTemplateFile { .. } => ErrorKind::Io,
        template::Error::Parse { .. } | template::Error::Execute(_) => ErrorKind::Template,
    }
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Index(err) => err.fmt(f),
            Error::Template(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::NotFound(path) => write!(f, "`{}` not found", path.display()),
            Error::Io { path, err } => write!(f, "`{}`: {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Index(err) => Some(err),
            Error::Template(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::NotFound(_) => None,
            Error::Io { path: _, err } => Some(err),
        }
    }
}

impl From<parser::Error> for Error {
    /// Converts [`parser::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: parser::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<write::Error> for Error {
    /// Converts [`write::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: write::Error) -> Error {
        Error::Write(err)
    }
}

impl From<index::Error> for Error {
    /// Converts [`index::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: index::Error) -> Error {
        Error::Index(err)
    }
}

impl From<template::Error> for Error {
    /// Converts [`template::Error`]s into [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: template::Error) -> Error {
        Error::Template(err)
    }
}
