//! The library code for the `sitegen` static site generator. A build is a
//! single sequential pass over two content sections, posts and projects, plus
//! a handful of top-level pages:
//!
//! 1. Collecting content records from descriptor files on disk
//!    ([`crate::parser`])
//! 2. Converting each record's markup to HTML and writing its page and static
//!    assets ([`crate::write`])
//! 3. Aggregating the written items into the blog, projects, and tag listing
//!    pages ([`crate::index`])
//!
//! [`crate::build`] stitches these together with the top-level pages and the
//! global static assets, and [`crate::config`] resolves the project file into
//! the directories every step reads from and writes to.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod format;
pub mod index;
pub mod markdown;
pub mod parser;
pub mod post;
pub mod tag;
pub mod template;
pub mod util;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
