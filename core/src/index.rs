//! Path-keyed result index and incremental assembler.
//!
//! Tokens live in an arena and are referred to by [`TokenId`]. The index maps
//! each path key to the ids created for it, in document order, so that
//! finding a parent or the token a closing tag belongs to never walks the
//! result tree.
//!
//! # Parent resolution
//!
//! For a token at `a/b/c` the candidates are the tokens registered at `a/b`.
//! A token is attached to the last candidate opened at or before it, provided
//! that candidate is still pending or its range contains the token (only the
//! opening offset when the token itself is still pending). Candidate opens are
//! strictly increasing, so that candidate is found by binary search. Closing
//! tags resolve the first pending token of their path through a cursor that
//! only moves forward.

use crate::token::{Position, Token};
use crate::traverse::parent_path;
use crate::{Error, Result};
use std::collections::HashMap;

/// Path key of the synthetic document token.
pub const DOCUMENT_PATH: &str = "";

/// Name of the synthetic document token returned by the parser.
pub const DOCUMENT_NAME: &str = "root";

/// Handle to a token stored in a [`ResultIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(usize);

#[derive(Debug)]
struct Slot {
    token: Option<Token>,
    order: usize,
    children: Vec<TokenId>,
}

#[derive(Debug, Default)]
struct PathEntry {
    ids: Vec<TokenId>,
    /// Every id before this index is resolved.
    first_open: usize,
}

/// Arena of tokens plus the path-keyed side index.
#[derive(Debug)]
pub struct ResultIndex {
    slots: Vec<Slot>,
    paths: HashMap<String, PathEntry>,
}

impl Default for ResultIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultIndex {
    /// Create an index holding only the open document token.
    pub fn new() -> Self {
        let mut index = Self {
            slots: Vec::with_capacity(64),
            paths: HashMap::new(),
        };
        let document = index.insert(
            Token::element(DOCUMENT_NAME, Position::pending(0), None),
            0,
        );
        index.register(DOCUMENT_PATH, document);
        index
    }

    /// The synthetic document token.
    #[inline]
    pub fn document(&self) -> TokenId {
        TokenId(0)
    }

    /// Store a token in the arena.
    ///
    /// `order` places the token among its future siblings when the output tree
    /// is assembled (declared order of its instruction node).
    pub fn insert(&mut self, token: Token, order: usize) -> TokenId {
        let id = TokenId(self.slots.len());
        self.slots.push(Slot {
            token: Some(token),
            order,
            children: Vec::new(),
        });
        id
    }

    /// Append `id` to the list of tokens created for `path`.
    pub fn register(&mut self, path: &str, id: TokenId) {
        match self.paths.get_mut(path) {
            Some(entry) => entry.ids.push(id),
            None => {
                self.paths.insert(
                    path.to_owned(),
                    PathEntry {
                        ids: vec![id],
                        first_open: 0,
                    },
                );
            }
        }
    }

    /// Attach `id` to its parent token.
    ///
    /// Returns the parent, or `None` if the last candidate opened before the
    /// token is already closed and does not contain it. Fails with
    /// [`Error::NodeParentNotFound`] if no candidate opened at or before the
    /// token.
    pub fn append(&mut self, path: &str, id: TokenId) -> Result<Option<TokenId>> {
        let parent_key = parent_path(path).unwrap_or(DOCUMENT_PATH);
        let position = self.position(id);

        let candidate = self.paths.get(parent_key).and_then(|entry| {
            let before = entry
                .ids
                .partition_point(|&p| slot_position(&self.slots, p).open <= position.open);
            before.checked_sub(1).map(|i| entry.ids[i])
        });
        let Some(parent) = candidate else {
            return Err(Error::NodeParentNotFound {
                path: parent_key.to_owned(),
            });
        };

        let parent_position = self.position(parent);
        if parent_position.is_resolved() && !encloses(parent_position, position) {
            return Ok(None);
        }
        self.slots[parent.0].children.push(id);
        Ok(Some(parent))
    }

    /// Resolve the first pending token at `path` with the given close offset.
    ///
    /// Returns the resolved token, or `None` if nothing at `path` was pending.
    pub fn close_open(&mut self, path: &str, close: i64) -> Option<TokenId> {
        let entry = self.paths.get_mut(path)?;
        let id = first_pending(entry, &self.slots)?;
        if let Some(token) = self.slots[id.0].token.as_mut() {
            token.position.close = close;
        }
        Some(id)
    }

    /// Current position of a token.
    #[inline]
    pub fn position(&self, id: TokenId) -> Position {
        slot_position(&self.slots, id)
    }

    /// Set the closing offset of a token directly.
    pub fn set_close(&mut self, id: TokenId, close: i64) {
        if let Some(token) = self.slots.get_mut(id.0).and_then(|s| s.token.as_mut()) {
            token.position.close = close;
        }
    }

    /// Number of tokens stored, including the document token.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: the document token is created up front.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The earliest-opened token still waiting for its closing tag, with its path.
    ///
    /// The document token is not considered.
    pub fn first_unresolved(&self) -> Option<(&str, Position)> {
        self.paths
            .iter()
            .filter(|(path, _)| path.as_str() != DOCUMENT_PATH)
            .flat_map(|(path, entry)| {
                entry.ids[entry.first_open.min(entry.ids.len())..]
                    .iter()
                    .map(move |&id| (path.as_str(), id))
            })
            .map(|(path, id)| (path, self.position(id)))
            .filter(|(_, position)| !position.is_resolved())
            .min_by_key(|(_, position)| position.open)
    }

    /// Number of tokens still waiting for their closing tag.
    pub fn unresolved_count(&self) -> usize {
        self.slots
            .iter()
            .skip(1)
            .filter_map(|s| s.token.as_ref())
            .filter(|t| !t.is_complete())
            .count()
    }

    /// Assemble the output tree rooted at the document token.
    pub fn into_token(mut self) -> Token {
        let document = self.document();
        self.assemble(document)
    }

    fn assemble(&mut self, id: TokenId) -> Token {
        let children = core::mem::take(&mut self.slots[id.0].children);
        let mut token = self.slots[id.0].token.take().unwrap_or_else(|| {
            Token::leaf(String::new(), Position::pending(0), None)
        });

        for child in children {
            let order = self.slots[child.0].order;
            let child = self.assemble(child);
            if let Err(child) = token.insert_child(order, child) {
                tracing::warn!(parent = %token.name, child = %child.name, "leaf token cannot hold children");
            }
        }
        token
    }
}

/// `parent` is resolved and covers `child`; an unresolved child only needs
/// its opening offset inside `parent`.
fn encloses(parent: Position, child: Position) -> bool {
    if child.is_resolved() {
        parent.contains(&child)
    } else {
        parent.is_resolved() && parent.open <= child.open && child.open < parent.close
    }
}

fn slot_position(slots: &[Slot], id: TokenId) -> Position {
    slots
        .get(id.0)
        .and_then(|s| s.token.as_ref())
        .map_or(Position::pending(0), |t| t.position)
}

fn first_pending(entry: &mut PathEntry, slots: &[Slot]) -> Option<TokenId> {
    while let Some(&id) = entry.ids.get(entry.first_open) {
        if !slot_position(slots, id).is_resolved() {
            return Some(id);
        }
        entry.first_open += 1;
    }
    None
}
