//! Deterministic pre-order traversal of the instruction tree.
//!
//! The matcher walks the same static tree once per chunk. The walk is
//! iterative (explicit stack of `(node, path, depth)`) and always visits nodes
//! in the same order: a parent is scanned before its children, so every
//! parent token opened before a child is already registered when the child
//! is attached.

use crate::instruction::InstructionNode;

/// Separator between tag names in a path key.
pub const PATH_SEPARATOR: char = '/';

/// One step of the traversal.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'a> {
    /// The node being visited.
    pub node: &'a InstructionNode,
    /// `/`-joined tag names from the root down to `node`, inclusive.
    pub path: &'a str,
    /// Distance from the root; the root has depth 0.
    pub depth: usize,
    /// Pre-order index of `node`; stable across traversals of the same tree.
    pub ordinal: usize,
}

/// Visit every node of the tree rooted at `root` in pre-order.
///
/// Stops at the first error returned by `visit` and propagates it.
pub fn dfs<'a, E, F>(root: &'a InstructionNode, mut visit: F) -> Result<(), E>
where
    F: FnMut(Visit<'_>) -> Result<(), E>,
{
    let mut stack: Vec<(&'a InstructionNode, String, usize)> =
        vec![(root, root.original().to_owned(), 0)];
    let mut ordinal = 0;

    while let Some((node, path, depth)) = stack.pop() {
        visit(Visit {
            node,
            path: &path,
            depth,
            ordinal,
        })?;
        ordinal += 1;

        for child in node.children().iter().rev() {
            let mut child_path = String::with_capacity(path.len() + 1 + child.original().len());
            child_path.push_str(&path);
            child_path.push(PATH_SEPARATOR);
            child_path.push_str(child.original());
            stack.push((child, child_path, depth + 1));
        }
    }

    Ok(())
}

/// The path key of the parent of `path`, or `None` for a top-level path.
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once(PATH_SEPARATOR).map(|(parent, _)| parent)
}
