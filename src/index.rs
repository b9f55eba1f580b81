//! The aggregation step: groups written items into listing pages. The blog
//! and projects pages list every item of their section, and one page per
//! tag lists every item carrying that tag. Listings are always ordered newest
//! first; items with the same date keep their input order.

use crate::format::{render_authors_string, render_date_string, NoAuthorsError};
use crate::post::{BuildArtifact, ContentRecord};
use crate::tag::Tag;
use crate::template::{self, render, Params, Templates};
use gtmpl::Template;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single listing page to write.
pub struct Listing<'a> {
    /// The listing template ([`Templates::blog`] or [`Templates::projects`]).
    pub template: &'a Template,

    /// The page title handed to the header template.
    pub title: String,

    /// The file name under the site root, e.g. `blog.html`.
    pub file_name: String,

    /// When set, only items carrying this tag are listed.
    pub tag: Option<&'a Tag>,
}

/// Writes listing pages into the site root.
pub struct Index<'a> {
    pub templates: &'a Templates,

    /// The site name, appended to listing titles.
    pub site_name: &'a str,

    /// The site root; listing pages are written directly inside it.
    pub output_directory: &'a Path,
}

impl Index<'_> {
    /// Renders `artifacts` (filtered by `listing.tag`, newest first) into
    /// `listing.template` and writes the page. Returns the written path.
    ///
    /// Listing pages never replace an existing file, so a top-level page or
    /// another listing with the same name is an error.
    pub fn write_listing(&self, listing: Listing, artifacts: &[&BuildArtifact]) -> Result<PathBuf> {
        let mut selected = with_tag(artifacts, listing.tag);
        sort_reverse_chronological(&mut selected);

        let text = render(
            listing.template,
            Params::new()
                .with("header", self.templates.header(&listing.title, "")?)
                .with("navbar", self.templates.navbar("")?)
                .with("depth", "")
                .with("title", listing.title.as_str())
                .with("posts", post_blocks(self.templates, &selected, "")?),
        )?;

        let path = self.output_directory.join(&listing.file_name);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(match listing.tag {
                    Some(tag) => Error::TagCollision {
                        tag: tag.name.clone(),
                        path,
                    },
                    None => Error::PageCollision(path),
                })
            }
            Err(err) => return Err(Error::Io { path, err }),
        };
        file.write_all(text.as_bytes())
            .map_err(|err| Error::Io { path: path.clone(), err })?;
        info!("Wrote {} ({} items)", path.display(), selected.len());
        Ok(path)
    }

    /// Writes `blog.html` listing every post.
    pub fn write_blog(&self, posts: &[BuildArtifact]) -> Result<PathBuf> {
        self.write_listing(
            Listing {
                template: &self.templates.blog,
                title: format!("Blog - {}", self.site_name),
                file_name: String::from("blog.html"),
                tag: None,
            },
            &posts.iter().collect::<Vec<_>>(),
        )
    }

    /// Writes `projects.html` listing every project.
    pub fn write_projects(&self, projects: &[BuildArtifact]) -> Result<PathBuf> {
        self.write_listing(
            Listing {
                template: &self.templates.projects,
                title: format!("Projects - {}", self.site_name),
                file_name: String::from("projects.html"),
                tag: None,
            },
            &projects.iter().collect::<Vec<_>>(),
        )
    }

    /// Writes one `{tag}.html` page per distinct tag across `artifacts`.
    pub fn write_tag_pages(&self, artifacts: &[&BuildArtifact]) -> Result<Vec<PathBuf>> {
        let partitions = partition_by_tag(artifacts);
        debug!(
            "Found tags {:?}",
            partitions.keys().map(|t| t.name.as_str()).collect::<Vec<_>>()
        );
        let mut written = Vec::with_capacity(partitions.len());
        for (tag, tagged) in &partitions {
            written.push(self.write_listing(
                Listing {
                    template: &self.templates.blog,
                    title: format!("{} - {}", tag.name, self.site_name),
                    file_name: tag.file_name(),
                    tag: Some(tag),
                },
                tagged,
            )?);
        }
        Ok(written)
    }
}

/// Sorts by publication date, newest first. The sort is stable.
pub fn sort_reverse_chronological(artifacts: &mut [&BuildArtifact]) {
    artifacts.sort_by(|a, b| b.record.date.cmp(&a.record.date));
}

/// The distinct tags of a record, in the order they first appear.
pub fn record_tags(record: &ContentRecord) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::with_capacity(record.tags.len());
    for name in &record.tags {
        let tag = Tag::new(name);
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Keeps the artifacts carrying `tag`, or all of them when `tag` is `None`.
pub fn with_tag<'a>(artifacts: &[&'a BuildArtifact], tag: Option<&Tag>) -> Vec<&'a BuildArtifact> {
    artifacts
        .iter()
        .filter(|a| match tag {
            None => true,
            Some(tag) => record_tags(&a.record).contains(tag),
        })
        .copied()
        .collect()
}

/// Groups artifacts by tag. An artifact with N distinct tags lands in N
/// groups; within a group artifacts keep their input order.
pub fn partition_by_tag<'a>(artifacts: &[&'a BuildArtifact]) -> BTreeMap<Tag, Vec<&'a BuildArtifact>> {
    let mut partitions: BTreeMap<Tag, Vec<&'a BuildArtifact>> = BTreeMap::new();
    for artifact in artifacts {
        for tag in record_tags(&artifact.record) {
            partitions.entry(tag).or_default().push(*artifact);
        }
    }
    partitions
}

/// The posts that list `project` among their projects, newest first.
pub fn related_posts<'a>(project: &ContentRecord, posts: &'a [BuildArtifact]) -> Vec<&'a BuildArtifact> {
    let id = project.id();
    let mut related: Vec<&BuildArtifact> = posts
        .iter()
        .filter(|post| post.record.projects.iter().any(|p| *p == id))
        .collect();
    sort_reverse_chronological(&mut related);
    related
}

/// Renders the tag links of an item for a page `depth` below the site root,
/// joined with `, `.
pub fn render_tags(templates: &Templates, record: &ContentRecord, depth: &str) -> Result<String> {
    let mut rendered = Vec::with_capacity(record.tags.len());
    for tag in record_tags(record) {
        let link = render(
            &templates.tag,
            Params::new()
                .with("link", format!("{}{}", depth, tag.file_name()))
                .with("tag", tag.name.as_str()),
        )?;
        rendered.push(link.trim_end().to_owned());
    }
    Ok(rendered.join(", "))
}

/// Renders one listing entry for a page `depth` below the site root.
pub fn post_block(templates: &Templates, artifact: &BuildArtifact, depth: &str) -> Result<String> {
    let record = &artifact.record;
    debug!("Building block for {}", record.title);
    Ok(render(
        &templates.post_block,
        Params::new()
            .with("title", record.title.as_str())
            .with("link", format!("{}{}", depth, artifact.link))
            .with("img_link", format!("{}{}", depth, artifact.thumbnail_link))
            .with("date", render_date_string(&record.date))
            .with("author", render_authors_string(&record.authors)?)
            .with("summary", format!("{} read more ...", record.description))
            .with("tags", render_tags(templates, record, depth)?),
    )?)
}

/// Renders the blocks of `artifacts` in the given order, newline separated.
pub fn post_blocks(templates: &Templates, artifacts: &[&BuildArtifact], depth: &str) -> Result<String> {
    let mut blocks = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        blocks.push(post_block(templates, artifact, depth)?);
    }
    Ok(blocks.join("\n"))
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing a listing page.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(template::Error),

    /// A listed item has no authors.
    Authors(NoAuthorsError),

    /// Returned when a tag page would overwrite another top-level page.
    TagCollision { tag: String, path: PathBuf },

    /// Returned when the blog or projects page would overwrite a top-level
    /// page of the same name.
    PageCollision(PathBuf),

    /// An error writing the page.
    Io { path: PathBuf, err: io::Error },
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
            Error::Template(err) => err.fmt(f),
            Error::Authors(err) => err.fmt(f),
            Error::TagCollision { tag, path } => write!(
                f,
                "tag `{}` would overwrite existing page `{}`",
                tag,
                path.display()
            ),
            Error::PageCollision(path) => {
                write!(f, "listing would overwrite existing page `{}`", path.display())
            }
            Error::Io { path, err } => write!(f, "`{}`: {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(err) => Some(err),
            Error::Authors(err) => Some(err),
            Error::TagCollision { .. } | Error::PageCollision(_) => None,
            Error::Io { path: _, err } => Some(err),
        }
    }
}
