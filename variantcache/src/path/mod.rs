//! Contains data structures to deal with paths in the local namespace.
use std::{
    fmt::{self, Debug, Display},
    str::FromStr,
};

mod component;
pub use component::{PathComponent, PathComponentError};

/// A path of a node in the local namespace.
/// These are always relative to the namespace root and use '/' as the
/// component separator. The empty path is the namespace root itself.
#[derive(Clone, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodePath {
    // Components are validated, so the inner string never contains empty
    // components, and never starts or ends with a slash.
    inner: String,
}

impl NodePath {
    /// The namespace root.
    pub fn root() -> NodePath {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the path without its final component, if there is one.
    ///
    /// Note that the parent of a bare name is the root.
    /// The root is the only path without a parent.
    pub fn parent(&self) -> Option<NodePath> {
        if self.inner.is_empty() {
            return None;
        }

        Some(match self.inner.rsplit_once('/') {
            Some((parent, _name)) => NodePath {
                inner: parent.to_owned(),
            },
            None => NodePath::root(),
        })
    }

    /// Creates a new path with `name` adjoined to self.
    pub fn try_join(&self, name: &str) -> Result<NodePath, PathComponentError> {
        let mut v = self.clone();
        v.try_push(name)?;
        Ok(v)
    }

    /// Adjoins `name` to self.
    pub fn try_push(&mut self, name: &str) -> Result<(), PathComponentError> {
        self.push(PathComponent::try_from(name)?);
        Ok(())
    }

    /// Adjoins an already validated component to self.
    pub fn push(&mut self, name: PathComponent) {
        if !self.inner.is_empty() {
            self.inner.push('/');
        }
        self.inner.push_str(name.as_str());
    }

    /// Provides an iterator over the components of the path.
    /// In case the path is the root, an empty iterator is returned.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        let mut iter = self.inner.split('/');

        // We don't want to return an empty element, consume it if it's the only one.
        if self.inner.is_empty() {
            let _ = iter.next();
        }

        iter
    }

    /// Returns the final component of the path, if there is one.
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Returns the path consisting of only the first component, which is the
    /// top-level container this path lives in.
    pub fn top_level(&self) -> Option<NodePath> {
        self.components().next().map(|first| NodePath {
            inner: first.to_owned(),
        })
    }

    /// Returns whether `self` equals `other` or lies below it.
    pub fn starts_with(&self, other: &NodePath) -> bool {
        if other.is_root() || self == other {
            return true;
        }

        self.inner
            .strip_prefix(other.inner.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl FromStr for NodePath {
    type Err = PathComponentError;

    fn from_str(s: &str) -> Result<NodePath, Self::Err> {
        let mut p = NodePath::root();
        if !s.is_empty() {
            for component in s.split('/') {
                p.try_push(component)?;
            }
        }
        Ok(p)
    }
}

impl Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Debug::fmt(&self.inner, f)
    }
}

impl Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.inner.is_empty() {
            return f.write_str("/");
        }
        Display::fmt(&self.inner, f)
    }
}

#[cfg(test)]
mod test {
    use super::{NodePath, PathComponent};
    use rstest::rstest;

    #[rstest]
    #[case::root("", 0)]
    #[case::single("a", 1)]
    #[case::nested("a/b/c", 3)]
    #[case::spaces("a b/c d", 2)]
    pub fn from_str(#[case] s: &str, #[case] num_components: usize) {
        let p: NodePath = s.parse().expect("must parse");

        assert_eq!(s, p.as_str());
        assert_eq!(num_components, p.components().count());
    }

    #[rstest]
    #[case::leading_slash("/a")]
    #[case::trailing_slash("a/")]
    #[case::double_slash("a//b")]
    #[case::dot("a/./b")]
    #[case::dotdot("a/../b")]
    #[case::null("a/\0")]
    pub fn from_str_fail(#[case] s: &str) {
        s.parse::<NodePath>().expect_err("must fail");
    }

    #[rstest]
    #[case::root("", None)]
    #[case::single("a", Some(""))]
    #[case::nested("a/b/c", Some("a/b"))]
    pub fn parent(#[case] p: NodePath, #[case] expected: Option<&str>) {
        let expected = expected.map(|e| e.parse::<NodePath>().unwrap());
        assert_eq!(expected, p.parent());
    }

    #[rstest]
    #[case::root("", None)]
    #[case::single("a", Some("a"))]
    #[case::nested("a/b/c", Some("a"))]
    pub fn top_level(#[case] p: NodePath, #[case] expected: Option<&str>) {
        let expected = expected.map(|e| e.parse::<NodePath>().unwrap());
        assert_eq!(expected, p.top_level());
    }

    #[rstest]
    #[case::same("a/b", "a/b", true)]
    #[case::below("a/b/c", "a/b", true)]
    #[case::root("a/b", "", true)]
    #[case::sibling_prefix("a/bc", "a/b", false)]
    #[case::above("a", "a/b", false)]
    pub fn starts_with(#[case] p: NodePath, #[case] other: NodePath, #[case] expected: bool) {
        assert_eq!(expected, p.starts_with(&other));
    }

    #[test]
    pub fn join() {
        let p: NodePath = "a".parse().unwrap();
        assert_eq!("a/b", p.try_join("b").unwrap().as_str());
        assert_eq!("b", NodePath::root().try_join("b").unwrap().as_str());
        p.try_join("b/c").expect_err("must fail");
    }

    #[test]
    pub fn push_component() {
        let mut p = NodePath::root();
        p.push(PathComponent::try_from("a").unwrap());
        p.push(PathComponent::try_from("b").unwrap());
        assert_eq!("a/b", p.as_str());
        assert_eq!(Some("b"), p.file_name());
    }

    #[test]
    pub fn display_root() {
        assert_eq!("/", NodePath::root().to_string());
    }
}
