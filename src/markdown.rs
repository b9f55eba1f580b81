//! The markup conversion service. Item bodies are converted to HTML through
//! the [`Converter`] trait, keyed by the format tag from the item's
//! descriptor. [`Markup`] handles Markdown in-process with [`pulldown_cmark`],
//! passes HTML through untouched, and hands every other format to an external
//! `pandoc` binary when one is configured.

use pulldown_cmark::{html, Options, Parser};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Converts markup text in some format into an HTML fragment.
pub trait Converter {
    fn convert(&self, text: &str, format: &str) -> Result<String>;
}

/// The default [`Converter`].
#[derive(Clone, Debug, Default)]
pub struct Markup {
    /// The `pandoc` executable used for formats without built-in support.
    pub pandoc: Option<PathBuf>,
}

impl Markup {
    pub fn new(pandoc: Option<PathBuf>) -> Markup {
        Markup { pandoc }
    }

    fn run_pandoc(&self, pandoc: &Path, text: &str, format: &str) -> Result<String> {
        let mut child = Command::new(pandoc)
            .args(&["-f", format, "-t", "html"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdin = child.stdin.take();
        // Feed stdin from a second thread while stdout and stderr drain here.
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(text.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer.join().unwrap_or_else(|_| {
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    "writing pandoc input panicked",
                ))
            });
            (output, written)
        });
        let output = output?;
        if !output.status.success() {
            return Err(Error::Pandoc {
                format: format.to_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        written?;
        String::from_utf8(output.stdout).map_err(|e| Error::Pandoc {
            format: format.to_owned(),
            stderr: e.to_string(),
        })
    }
}

impl Converter for Markup {
    fn convert(&self, text: &str, format: &str) -> Result<String> {
        match format {
            "markdown" | "md" | "commonmark" | "gfm" => Ok(to_html(text)),
            "html" => Ok(text.to_owned()),
            _ => match &self.pandoc {
                Some(pandoc) => self.run_pandoc(pandoc, text, format),
                None => Err(Error::UnsupportedFormat(format.to_owned())),
            },
        }
    }
}

/// Converts markdown to HTML.
pub fn to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error converting markup to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned for a format with no built-in support when no `pandoc` is
    /// configured.
    UnsupportedFormat(String),

    /// Returned when `pandoc` exits unsuccessfully or emits invalid UTF-8.
    Pandoc { format: String, stderr: String },

    /// Returned when `pandoc` can't be started or talked to.
    Io(io::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedFormat(format) => write!(
                f,
                "unsupported markup format `{}` (configure `pandoc` to convert it)",
                format
            ),
            Error::Pandoc { format, stderr } => {
                write!(f, "pandoc failed converting `{}`: {}", format, stderr)
            }
            Error::Io(err) => write!(f, "running pandoc: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::UnsupportedFormat(_) => None,
            Error::Pandoc { .. } => None,
            Error::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for IO operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}


#[cfg(all(test, unix))]
mod pandoc_test {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_pandoc_converts() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let pandoc = script(
            &tmp,
            "pandoc",
            "read -r first\ncat > /dev/null\necho \"<p>$*: $first</p>\"\n",
        );

        let html = Markup::new(Some(pandoc)).convert("Title\n=====\n", "rst")?;

        assert_eq!("<p>-f rst -t html: Title</p>\n", html);
        Ok(())
    }

    #[test]
    fn test_pandoc_failure_carries_stderr() {
        let tmp = TempDir::new().unwrap();
        let pandoc = script(
            &tmp,
            "pandoc",
            "cat > /dev/null\necho \"Unknown input format $2\" >&2\nexit 1\n",
        );

        match Markup::new(Some(pandoc)).convert("text", "rst") {
            Err(Error::Pandoc { format, stderr }) => {
                assert_eq!("rst", format);
                assert_eq!("Unknown input format rst", stderr);
            }
            other => panic!("wanted Pandoc error, got {:?}", other),
        }
    }

    #[test]
    fn test_pandoc_large_input() -> Result<()> {
        let tmp = TempDir::new().unwrap();
        let pandoc = script(&tmp, "pandoc", "cat\n");
        let text = "line of text that is echoed back\n".repeat(20_000);

        let html = Markup::new(Some(pandoc)).convert(&text, "rst")?;

        assert_eq!(text, html);
        Ok(())
    }
}
