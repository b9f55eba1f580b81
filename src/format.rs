//! Text helpers shared by post pages and post blocks.

use chrono::NaiveDate;
use std::fmt;

/// Renders an author byline: `A`, `A and B`, or `A, B, and C`.
pub fn render_authors_string(authors: &[String]) -> Result<String, NoAuthorsError> {
    match authors {
        [] => Err(NoAuthorsError),
        [only] => Ok(only.clone()),
        [first, second] => Ok(format!("{} and {}", first, second)),
        [init @ .., last] => Ok(format!("{}, and {}", init.join(", "), last)),
    }
}

/// Renders a date as `Month D, YYYY` without zero-padding the day.
pub fn render_date_string(date: &NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Returned by [`render_authors_string`] for an empty author list.
#[derive(Debug, PartialEq)]
pub struct NoAuthorsError;

impl fmt::Display for NoAuthorsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "no authors provided")
    }
}

impl std::error::Error for NoAuthorsError {}
