//! The nested story-element tree and its JSON representation.
//!
//! A stage's tree maps generated text keys to either further nesting
//! (internal levels) or an opaque identifier (the deepest populated
//! level). On disk this is a plain nested JSON object whose leaf values
//! are identifier strings. In memory the nesting is an explicitly typed
//! node, and children keep insertion order, which is also persisted
//! order and traversal order.

use crate::error::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Ordered list of node keys from the root down to one node.
pub type KeyPath = Vec<String>;

/// Opaque identifier carried by a populated leaf.
///
/// Freshly generated leaves get UUID strings. Externally supplied trees
/// (the theme file) may carry any identifier string, so the type stays
/// an opaque wrapper rather than a parsed UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeafId(String);

impl LeafId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeafId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for LeafId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Internal level; children in insertion order. Serialized as a JSON
    /// object.
    Branch(Vec<(String, Node)>),
    /// Deepest populated level. Serialized as the identifier string.
    Leaf(LeafId),
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Node::Leaf(id) => serializer.serialize_str(id.as_str()),
            Node::Branch(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (key, child) in children {
                    map.serialize_entry(key, child)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct NodeVisitor;

        impl<'de> Visitor<'de> for NodeVisitor {
            type Value = Node;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an identifier string or a nested object")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Node, E> {
                Ok(Node::Leaf(LeafId::from(value)))
            }

            fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Node, E> {
                Ok(Node::Leaf(LeafId::from(value)))
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Node, A::Error> {
                let mut children = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, child)) = access.next_entry::<String, Node>()? {
                    children.push((key, child));
                }
                Ok(Node::Branch(children))
            }
        }

        deserializer.deserialize_any(NodeVisitor)
    }
}

/// A stage's tree of story elements keyed by generated text.
///
/// The root is always a branch; leaf identifiers sit at the deepest
/// level the stage has populated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTree {
    root: Node,
}

impl ModuleTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            root: Node::Branch(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.root, Node::Branch(children) if children.is_empty())
    }

    fn node_at(&self, path: &[String]) -> Option<&Node> {
        let mut node = &self.root;
        for key in path {
            match node {
                Node::Branch(children) => {
                    node = children.iter().find(|(k, _)| k == key).map(|(_, c)| c)?;
                }
                Node::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    /// Walk to `path`, creating empty branches for missing components.
    fn ensure_path_mut(&mut self, path: &[String]) -> Result<&mut Node> {
        let mut node = &mut self.root;
        for (depth, key) in path.iter().enumerate() {
            let children = match node {
                Node::Branch(children) => children,
                Node::Leaf(_) => return Err(Error::NotABranch(path[..depth].to_vec())),
            };
            let pos = match children.iter().position(|(k, _)| k == key) {
                Some(pos) => pos,
                None => {
                    children.push((key.clone(), Node::Branch(Vec::new())));
                    children.len() - 1
                }
            };
            node = &mut children[pos].1;
        }
        Ok(node)
    }

    /// Create the branch at `path` if absent.
    ///
    /// Errors if any path component is already a populated leaf.
    pub fn ensure_branch(&mut self, path: &[String]) -> Result<()> {
        match self.ensure_path_mut(path)? {
            Node::Branch(_) => Ok(()),
            Node::Leaf(_) => Err(Error::NotABranch(path.to_vec())),
        }
    }

    /// Keys of the children under `path`, in insertion order.
    ///
    /// A missing or leaf node has no children.
    pub fn child_keys(&self, path: &[String]) -> Vec<String> {
        match self.node_at(path) {
            Some(Node::Branch(children)) => children.iter().map(|(k, _)| k.clone()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn child_count(&self, path: &[String]) -> usize {
        match self.node_at(path) {
            Some(Node::Branch(children)) => children.len(),
            _ => 0,
        }
    }

    /// Insert `key -> id` under the branch at `path`, creating the branch
    /// if needed.
    ///
    /// Returns `false` and leaves the tree unchanged if the key already
    /// exists under that parent, so an identifier is never reassigned.
    pub fn insert_leaf(&mut self, path: &[String], key: &str, id: LeafId) -> Result<bool> {
        let node = self.ensure_path_mut(path)?;
        let children = match node {
            Node::Branch(children) => children,
            Node::Leaf(_) => return Err(Error::NotABranch(path.to_vec())),
        };
        if children.iter().any(|(k, _)| k == key) {
            return Ok(false);
        }
        children.push((key.to_string(), Node::Leaf(id)));
        Ok(true)
    }

    /// Identifier of the leaf at exactly `path`, if populated.
    pub fn leaf_id(&self, path: &[String]) -> Option<&LeafId> {
        match self.node_at(path) {
            Some(Node::Leaf(id)) => Some(id),
            _ => None,
        }
    }

    /// All populated leaves as `(key path, id)`, in depth-first insertion
    /// order. This is the traversal order of every pipeline pass.
    pub fn leaf_entries(&self) -> Vec<(KeyPath, &LeafId)> {
        fn walk<'a>(node: &'a Node, path: &mut KeyPath, out: &mut Vec<(KeyPath, &'a LeafId)>) {
            match node {
                Node::Leaf(id) => out.push((path.clone(), id)),
                Node::Branch(children) => {
                    for (key, child) in children {
                        path.push(key.clone());
                        walk(child, path, out);
                        path.pop();
                    }
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.root, &mut Vec::new(), &mut out);
        out
    }
}

impl Default for ModuleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for ModuleTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ModuleTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let root = Node::deserialize(deserializer)?;
        match root {
            Node::Branch(_) => Ok(Self { root }),
            Node::Leaf(_) => Err(de::Error::custom("tree root must be an object")),
        }
    }
}
