//! The template service. Every theme template is read and parsed exactly once
//! per build into a [`Templates`] value that the rest of the pipeline borrows.
//! Templates use Go-template syntax ([`gtmpl`]) and are rendered from
//! [`Params`], a flat set of named string parameters.

use gtmpl::{Context, Template};
use gtmpl_value::Value;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// The parsed theme templates.
pub struct Templates {
    /// Renders the `<head>` of every page from `title` and `depth`.
    pub header: Template,

    /// Renders the navigation block from `depth`.
    pub navbar: Template,

    /// Renders a post page.
    pub post: Template,

    /// Renders a project page.
    pub project: Template,

    /// Renders one entry of a listing page.
    pub post_block: Template,

    /// Renders a single tag link from `link` and `tag`.
    pub tag: Template,

    /// Renders the blog listing and the tag pages.
    pub blog: Template,

    /// Renders the projects listing.
    pub projects: Template,
}

impl Templates {
    /// Loads the theme templates from `dir`. Each template lives in a file
    /// named after its field, e.g. `post_block.html`.
    pub fn load(dir: &Path) -> Result<Templates> {
        let load = |name: &str| parse_template(&dir.join(format!("{}.html", name)));
        Ok(Templates {
            header: load("header")?,
            navbar: load("navbar")?,
            post: load("post")?,
            project: load("project")?,
            post_block: load("post_block")?,
            tag: load("tag")?,
            blog: load("blog")?,
            projects: load("projects")?,
        })
    }

    /// Renders the header for a page titled `title`, `depth` directories
    /// below the site root.
    pub fn header(&self, title: &str, depth: &str) -> Result<String> {
        render(
            &self.header,
            Params::new().with("title", title).with("depth", depth),
        )
    }

    /// Renders the navigation block for a page `depth` directories below the
    /// site root.
    pub fn navbar(&self, depth: &str) -> Result<String> {
        render(&self.navbar, Params::new().with("depth", depth))
    }
}

/// Reads and parses the template file at `path`.
pub fn parse_template(path: &Path) -> Result<Template> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound(path.to_owned()))
        }
        Err(e) => {
            return Err(Error::OpenTemplateFile {
                path: path.to_owned(),
                err: e,
            })
        }
    };
    parse_str(&contents).map_err(|err| Error::Parse {
        path: path.to_owned(),
        err,
    })
}

/// Parses template source text.
pub fn parse_str(contents: &str) -> std::result::Result<Template, String> {
    let mut template = Template::default();
    template.parse(contents)?;
    Ok(template)
}

/// Renders `template` with `params` into a string.
pub fn render(template: &Template, params: Params) -> Result<String> {
    let mut out: Vec<u8> = Vec::new();
    let context = Context::from(Value::Object(params.0)).map_err(Error::Execute)?;
    template.execute(&mut out, &context).map_err(Error::Execute)?;
    String::from_utf8(out).map_err(|e| Error::Execute(e.to_string()))
}

/// Named template parameters.
#[derive(Clone, Debug, Default)]
pub struct Params(HashMap<String, Value>);

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    /// Adds a string parameter.
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Params {
        self.0.insert(name.to_owned(), Value::String(value.into()));
        self
    }

    /// Adds every parameter from `other`, overwriting on conflict.
    pub fn merge(mut self, other: Params) -> Params {
        self.0.extend(other.0);
        self
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading or rendering a template.
#[derive(Debug)]
pub enum Error {
    /// Returned when a template file doesn't exist.
    NotFound(PathBuf),

    /// Returned for other I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    Parse { path: PathBuf, err: String },

    /// Returned for errors while executing a template.
    Execute(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(path) => write!(f, "template `{}` not found", path.display()),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Parsing template file '{}': {}", path.display(), err)
            }
            Error::Execute(err) => write!(f, "Rendering template: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            _ => None,
        }
    }
}
