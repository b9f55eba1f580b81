//! Defines the [`Tag`] type, which represents a tag on a post or project.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A tag as written in a descriptor together with the file-safe slug naming
/// its tag page (`{slug}.html` at the site root). Two tags are the same tag
/// when their slugs match, so e.g. `Rust` and `rust` share a page.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as written in the descriptor.
    pub name: String,

    /// The slugified name.
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            slug: slug::slugify(name),
        }
    }

    /// The tag page's file name.
    pub fn file_name(&self) -> String {
        format!("{}.html", self.slug)
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.slug.cmp(&other.slug)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tags_match_by_slug() {
        assert_eq!(Tag::new("Machine Learning"), Tag::new("machine-learning"));
        assert_ne!(Tag::new("rust"), Tag::new("go"));
        assert_eq!("machine-learning.html", Tag::new("Machine Learning").file_name());
    }
}
