//! Hypermedia links.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relation of the link pointing at the resource itself.
pub const SELF_REL: &str = "self";

/// Relation of the previous page of a paged collection.
pub const PREV_REL: &str = "prev";

/// Relation of the next page of a paged collection.
pub const NEXT_REL: &str = "next";

/// A single link: a target URI and the relation it represents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    href: String,
    rel: String,
}

impl Link {
    /// Creates a link with the given href and relation.
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
        }
    }

    /// Creates a `self` link.
    pub fn self_link(href: impl Into<String>) -> Self {
        Self::new(href, SELF_REL)
    }

    /// Returns the target URI.
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Returns the relation name.
    pub fn rel(&self) -> &str {
        &self.rel
    }

    /// Returns true if this is a `self` link.
    pub fn is_self(&self) -> bool {
        self.rel == SELF_REL
    }

    /// Returns a copy of this link under a different relation.
    #[must_use]
    pub fn with_rel(&self, rel: impl Into<String>) -> Self {
        Self::new(self.href.clone(), rel)
    }

    /// Returns a link whose href has `segment` appended as a path segment.
    #[must_use]
    pub fn slash(&self, segment: &str) -> Self {
        let base = self.href.trim_end_matches('/');
        let segment = segment.trim_start_matches('/');
        Self::new(format!("{base}/{segment}"), self.rel.clone())
    }
}

/// Renders the link in `Link` header form: `<href>;rel="rel"`.
impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>;rel=\"{}\"", self.href, self.rel)
    }
}

/// An ordered list of links.
///
/// Order is insertion order; relations may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Links(Vec<Link>);

impl Links {
    /// Creates an empty link list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a link.
    pub fn push(&mut self, link: Link) {
        self.0.push(link);
    }

    /// Returns this list with `link` appended.
    #[must_use]
    pub fn and(mut self, link: Link) -> Self {
        self.0.push(link);
        self
    }

    /// Returns true if any link carries the given relation.
    pub fn has_link(&self, rel: &str) -> bool {
        self.0.iter().any(|l| l.rel == rel)
    }

    /// Returns the first link with the given relation.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.0.iter().find(|l| l.rel == rel)
    }

    /// Returns every link with the given relation, in order.
    pub fn all<'a>(&'a self, rel: &'a str) -> impl Iterator<Item = &'a Link> + 'a {
        self.0.iter().filter(move |l| l.rel == rel)
    }

    /// Returns the `self` link, if present.
    pub fn self_link(&self) -> Option<&Link> {
        self.get(SELF_REL)
    }

    /// Iterates the links in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Distinct relation names in first-seen order.
    pub fn rels(&self) -> Vec<&str> {
        let mut rels: Vec<&str> = Vec::new();
        for link in &self.0 {
            if !rels.contains(&link.rel.as_str()) {
                rels.push(&link.rel);
            }
        }
        rels
    }

    pub fn into_vec(self) -> Vec<Link> {
        self.0
    }
}

impl Extend<Link> for Links {
    fn extend<I: IntoIterator<Item = Link>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Link> for Links {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Links {
    type Item = Link;
    type IntoIter = std::vec::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
