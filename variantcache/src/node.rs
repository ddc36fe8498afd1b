use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};

use serde::Deserialize;

use crate::path::NodePath;
use crate::Error;

/// Whether a node can have children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Container,
    Leaf,
}

/// How far below a node an operation reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// The node only.
    Zero,
    /// The node and its direct children.
    One,
    /// The node and its whole subtree.
    Infinite,
}

impl Depth {
    /// The depth to use for the children of a node visited at `self`.
    pub fn for_children(self) -> Depth {
        match self {
            Depth::Infinite => Depth::Infinite,
            Depth::Zero | Depth::One => Depth::Zero,
        }
    }
}

/// A position in the local namespace.
///
/// LocalNodes are plain values: they identify a node by its path and carry
/// the kind it has (or would have), but they don't imply the node exists.
/// Equality and hashing only consider the path.
#[derive(Clone, Debug)]
pub struct LocalNode {
    path: NodePath,
    kind: NodeKind,
}

impl LocalNode {
    pub fn new(path: NodePath, kind: NodeKind) -> Self {
        Self { path, kind }
    }

    /// The namespace root, which is always a container.
    pub fn root() -> Self {
        Self::new(NodePath::root(), NodeKind::Container)
    }

    /// Parses `path` into a container node.
    pub fn container(path: &str) -> Result<Self, Error> {
        Ok(Self::new(path.parse()?, NodeKind::Container))
    }

    /// Parses `path` into a leaf node.
    pub fn leaf(path: &str) -> Result<Self, Error> {
        Ok(Self::new(path.parse()?, NodeKind::Leaf))
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_container(&self) -> bool {
        self.kind == NodeKind::Container
    }

    /// The last path component. Empty for the namespace root.
    pub fn name(&self) -> &str {
        self.path.file_name().unwrap_or_default()
    }

    /// Returns the path of the parent node, if there is one.
    pub fn parent_path(&self) -> Option<NodePath> {
        self.path.parent()
    }

    /// Returns the top-level container this node lives in. The namespace root
    /// has none.
    pub fn top_level(&self) -> Option<LocalNode> {
        self.path
            .top_level()
            .map(|p| LocalNode::new(p, NodeKind::Container))
    }

    /// Constructs a handle for the child `name` of this node.
    /// This doesn't touch the namespace, the child doesn't need to exist.
    /// Fails if self is a leaf, as leaves can't have children.
    pub fn child(&self, name: &str, kind: NodeKind) -> Result<LocalNode, Error> {
        if self.kind == NodeKind::Leaf {
            return Err(Error::Inconsistent(format!(
                "leaf {} cannot be the parent of {}",
                self.path, name
            )));
        }

        let path = self
            .path
            .try_join(name)
            .map_err(|e| Error::Inconsistent(format!("invalid child name {:?}: {}", name, e)))?;

        Ok(LocalNode::new(path, kind))
    }
}

impl PartialEq for LocalNode {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for LocalNode {}

impl Hash for LocalNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state)
    }
}

impl PartialOrd for LocalNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LocalNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path.cmp(&other.path)
    }
}

impl Display for LocalNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.path, f)
    }
}
