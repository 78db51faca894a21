//! Watched-tag configuration and the compiled instruction tree.
//!
//! The configuration is a tree of tag names, each marked as an element
//! (structural, may have watched children) or a leaf (its text is extracted).
//! [`InstructionTree::build`] compiles it once into byte patterns that the
//! matcher searches for on every chunk.
//!
//! # Persisted format
//!
//! ```text
//! {
//!   "version": "1",
//!   "nodes": [
//!     { "name": "items", "type": "xml-node", "children": [
//!       { "name": "item", "type": "xml-node", "children": [
//!         { "name": "name", "type": "xml-data" }
//!       ]}
//!     ]}
//!   ]
//! }
//! ```

use crate::{Error, Result};
use memchr::memmem::Finder;

/// Bytes that cannot appear inside a watched tag name.
const FORBIDDEN_NAME_BYTES: &[u8] = b"<>/=\"' \t\r\n";

/// How a watched tag is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Structural tag: attributes are captured and watched children nest under it.
    #[cfg_attr(feature = "serde", serde(rename = "xml-node"))]
    Element,
    /// Data tag: the text between its tags becomes the token value.
    #[cfg_attr(feature = "serde", serde(rename = "xml-data"))]
    Leaf,
}

/// A node of the declarative watched-tag tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchedTagNode {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: NodeKind,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub children: Vec<WatchedTagNode>,
}

impl WatchedTagNode {
    pub fn element(name: impl Into<String>, children: impl IntoIterator<Item = WatchedTagNode>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Element,
            children: children.into_iter().collect(),
        }
    }

    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Leaf,
            children: Vec::new(),
        }
    }
}

/// The persisted watched-tag document: `{ version, nodes }`.
///
/// `nodes` holds exactly one entry, the outermost watched tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchedTags {
    #[cfg_attr(feature = "serde", serde(default))]
    pub version: String,
    pub nodes: Vec<WatchedTagNode>,
}

impl WatchedTags {
    pub fn new(version: impl Into<String>, root: WatchedTagNode) -> Self {
        Self {
            version: version.into(),
            nodes: vec![root],
        }
    }

    /// Decode the JSON document.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode the JSON document from raw bytes.
    #[cfg(feature = "serde")]
    pub fn from_slice(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Encode the document back to JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A compiled watched tag.
///
/// `open` is `<name` without the closing `>` so that attributes may follow;
/// `close` is `</name>`.
#[derive(Debug, Clone)]
pub struct InstructionNode {
    original: String,
    kind: NodeKind,
    open: Finder<'static>,
    close: Finder<'static>,
    children: Vec<InstructionNode>,
}

impl InstructionNode {
    fn compile(node: &WatchedTagNode) -> Result<Self> {
        validate_name(&node.name)?;

        if node.kind == NodeKind::Leaf && !node.children.is_empty() {
            return Err(Error::invalid_config(format!(
                "leaf `{}` cannot declare children",
                node.name
            )));
        }

        let mut children = Vec::with_capacity(node.children.len());
        for (i, child) in node.children.iter().enumerate() {
            if node.children[..i].iter().any(|c| c.name == child.name) {
                return Err(Error::invalid_config(format!(
                    "`{}` declares child `{}` more than once",
                    node.name, child.name
                )));
            }
            children.push(Self::compile(child)?);
        }

        let open = format!("<{}", node.name);
        let close = format!("</{}>", node.name);

        Ok(Self {
            original: node.name.clone(),
            kind: node.kind,
            open: Finder::new(open.as_bytes()).into_owned(),
            close: Finder::new(close.as_bytes()).into_owned(),
            children,
        })
    }

    /// The tag name as configured.
    #[inline]
    pub fn original(&self) -> &str {
        &self.original
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Leaf
    }

    /// Bytes of `<name`.
    #[inline]
    pub fn open_pattern(&self) -> &[u8] {
        self.open.needle()
    }

    /// Bytes of `</name>`.
    #[inline]
    pub fn close_pattern(&self) -> &[u8] {
        self.close.needle()
    }

    #[inline]
    pub(crate) fn open_finder(&self) -> &Finder<'static> {
        &self.open
    }

    #[inline]
    pub(crate) fn close_finder(&self) -> &Finder<'static> {
        &self.close
    }

    /// Children in declared order.
    #[inline]
    pub fn children(&self) -> &[InstructionNode] {
        &self.children
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

/// Immutable compiled tree of watched tags.
#[derive(Debug, Clone)]
pub struct InstructionTree {
    root: InstructionNode,
    len: usize,
}

impl InstructionTree {
    /// Compile a watched-tag document.
    ///
    /// Fails with [`Error::InvalidConfig`] if the document has no root node,
    /// more than one root node, or a node that cannot be matched.
    pub fn build(config: &WatchedTags) -> Result<Self> {
        match config.nodes.as_slice() {
            [] => Err(Error::invalid_config("configuration has no root node")),
            [root] => Self::from_root(root),
            nodes => Err(Error::invalid_config(format!(
                "configuration declares {} root nodes, expected one",
                nodes.len()
            ))),
        }
    }

    /// Compile a tree starting at a single root node.
    pub fn from_root(root: &WatchedTagNode) -> Result<Self> {
        let root = InstructionNode::compile(root)?;
        let len = root.count();
        Ok(Self { root, len })
    }

    #[inline]
    pub fn root(&self) -> &InstructionNode {
        &self.root
    }

    /// Number of watched tags in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: a compiled tree has at least its root.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_config("tag name is empty"));
    }
    if let Some(b) = name.bytes().find(|b| FORBIDDEN_NAME_BYTES.contains(b)) {
        return Err(Error::invalid_config(format!(
            "tag name `{}` contains forbidden byte {:?}",
            name, b as char
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> WatchedTags {
        WatchedTags::new(
            "1",
            WatchedTagNode::element(
                "root",
                [WatchedTagNode::element(
                    "items",
                    [WatchedTagNode::element(
                        "item",
                        [WatchedTagNode::leaf("name"), WatchedTagNode::leaf("price")],
                    )],
                )],
            ),
        )
    }

    #[test]
    fn test_patterns() {
        let tree = InstructionTree::build(&catalog()).unwrap();
        let root = tree.root();

        assert_eq!(root.original(), "root");
        assert_eq!(root.open_pattern(), b"<root");
        assert_eq!(root.close_pattern(), b"</root>");
        assert_eq!(root.kind(), NodeKind::Element);
        assert_eq!(tree.len(), 5);
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_children_keep_declared_order() {
        let tree = InstructionTree::build(&catalog()).unwrap();
        let item = &tree.root().children()[0].children()[0];
        let names: Vec<_> = item.children().iter().map(|c| c.original()).collect();

        assert_eq!(names, ["name", "price"]);
        assert!(item.children().iter().all(InstructionNode::is_leaf));
    }

    #[test]
    fn test_empty_config_is_invalid() {
        let config = WatchedTags {
            version: "1".into(),
            nodes: vec![],
        };
        assert!(matches!(
            InstructionTree::build(&config),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_multiple_roots_are_invalid() {
        let config = WatchedTags {
            version: "1".into(),
            nodes: vec![WatchedTagNode::leaf("a"), WatchedTagNode::leaf("b")],
        };
        assert!(matches!(
            InstructionTree::build(&config),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_bad_names_are_invalid() {
        for name in ["", "a b", "a>b", "</x", "k=v"] {
            let result = InstructionTree::from_root(&WatchedTagNode::leaf(name));
            assert!(
                matches!(result, Err(Error::InvalidConfig { .. })),
                "{:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_namespaced_name_is_valid() {
        let tree = InstructionTree::from_root(&WatchedTagNode::leaf("soap:Body")).unwrap();
        assert_eq!(tree.root().open_pattern(), b"<soap:Body");
    }

    #[test]
    fn test_duplicate_siblings_are_invalid() {
        let root = WatchedTagNode::element(
            "item",
            [WatchedTagNode::leaf("name"), WatchedTagNode::leaf("name")],
        );
        assert!(matches!(
            InstructionTree::from_root(&root),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_leaf_with_children_is_invalid() {
        let root = WatchedTagNode {
            name: "name".into(),
            kind: NodeKind::Leaf,
            children: vec![WatchedTagNode::leaf("first")],
        };
        assert!(InstructionTree::from_root(&root).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let json = r#"{
            "version": "1.0",
            "nodes": [
                { "name": "recommendation", "type": "xml-node", "children": [
                    { "name": "amount", "type": "xml-data" }
                ]}
            ]
        }"#;

        let config = WatchedTags::from_json(json).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.nodes[0].kind, NodeKind::Element);
        assert_eq!(config.nodes[0].children[0], WatchedTagNode::leaf("amount"));

        let back = WatchedTags::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json_rejects_unknown_type() {
        let json = r#"{ "version": "1", "nodes": [{ "name": "a", "type": "xml-text" }] }"#;
        assert!(matches!(
            WatchedTags::from_json(json),
            Err(Error::ConfigFormat(_))
        ));
    }
}
