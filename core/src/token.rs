//! Extracted result tokens.
//!
//! A [`Token`] is what the parser hands back for every watched tag it finds:
//! the tag name, the absolute byte range it covers in the stream, and either
//! the extracted text (leaf tags) or the captured attributes and nested
//! children (element tags).
//!
//! Children are kept in an ordered multimap. The first occurrence of a child
//! tag name is stored as a single token; the second occurrence promotes the
//! entry to a list, and later occurrences append to it. This mirrors the usual
//! "repeated siblings become arrays" shape without a cardinality schema.

use core::fmt;

/// Sentinel used for a closing position that has not been observed yet.
pub const UNRESOLVED: i64 = -1;

/// Absolute byte range of a token within the whole stream.
///
/// `open` is the offset of the `<` of the opening tag. `close` is the offset
/// one past the `>` of the closing tag, or [`UNRESOLVED`] while the closing tag
/// has not been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub open: i64,
    pub close: i64,
}

impl Position {
    #[inline]
    pub const fn new(open: i64, close: i64) -> Self {
        Self { open, close }
    }

    /// A position whose closing tag is still pending.
    #[inline]
    pub const fn pending(open: i64) -> Self {
        Self {
            open,
            close: UNRESOLVED,
        }
    }

    #[inline]
    pub const fn is_resolved(&self) -> bool {
        self.close != UNRESOLVED
    }

    /// Returns true if `other` lies within this range.
    ///
    /// Always false when either range is unresolved.
    #[inline]
    pub const fn contains(&self, other: &Position) -> bool {
        self.is_resolved()
            && other.is_resolved()
            && self.open <= other.open
            && self.close >= other.close
    }
}

/// Whether a token came from an element tag or a leaf (data) tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A structural tag: raw attributes plus nested watched tags.
    Element {
        attribute: Option<String>,
        children: Children,
    },
    /// A data tag: the text between its opening and closing tags.
    ///
    /// `value` is `None` only when the closing tag never arrived.
    Leaf { value: Option<String> },
}

/// A single extracted tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub name: String,
    pub position: Position,
    pub kind: TokenKind,
}

impl Token {
    pub fn element(name: impl Into<String>, position: Position, attribute: Option<String>) -> Self {
        Self {
            name: name.into(),
            position,
            kind: TokenKind::Element {
                attribute,
                children: Children::default(),
            },
        }
    }

    pub fn leaf(name: impl Into<String>, position: Position, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            position,
            kind: TokenKind::Leaf { value },
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TokenKind::Leaf { .. })
    }

    /// Returns false if the closing tag of this token was never observed.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.position.is_resolved()
    }

    /// Extracted text of a leaf token. Always `None` for elements.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Leaf { value } => value.as_deref(),
            TokenKind::Element { .. } => None,
        }
    }

    /// Raw attribute bytes of an element token, e.g. `id="7"`.
    pub fn attribute(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Element { attribute, .. } => attribute.as_deref(),
            TokenKind::Leaf { .. } => None,
        }
    }

    /// Nested tokens. Leaves have none.
    pub fn children(&self) -> Option<&Children> {
        match &self.kind {
            TokenKind::Element { children, .. } => Some(children),
            TokenKind::Leaf { .. } => None,
        }
    }

    /// The child entry stored under `name`, if any.
    pub fn child(&self, name: &str) -> Option<&Child> {
        self.children().and_then(|c| c.get(name))
    }

    /// All children stored under `name`, in document order.
    pub fn children_named(&self, name: &str) -> &[Token] {
        self.child(name).map_or(&[][..], Child::as_slice)
    }

    /// The first child stored under `name`.
    pub fn first(&self, name: &str) -> Option<&Token> {
        self.children_named(name).first()
    }

    /// Attach `child` under its tag name, promoting to a list on repeats.
    ///
    /// `order` positions a new entry among its siblings; entries with a lower
    /// order come first. Returns the token back if `self` is a leaf.
    pub fn insert_child(&mut self, order: usize, child: Token) -> Result<(), Token> {
        match &mut self.kind {
            TokenKind::Element { children, .. } => {
                children.insert(order, child);
                Ok(())
            }
            TokenKind::Leaf { .. } => Err(child),
        }
    }

    /// Total number of tokens in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self
            .children()
            .map_or(0, |c| c.iter().map(|(_, t)| t.count()).sum::<usize>())
    }

    fn write_outline(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(
            f,
            "{:indent$}{} [{}, {}]",
            "",
            self.name,
            self.position.open,
            self.position.close,
            indent = depth * 2
        )?;
        match &self.kind {
            TokenKind::Element {
                attribute,
                children,
            } => {
                if let Some(attribute) = attribute {
                    write!(f, " {}", attribute)?;
                }
                writeln!(f)?;
                for (_, child) in children.iter() {
                    child.write_outline(f, depth + 1)?;
                }
                Ok(())
            }
            TokenKind::Leaf { value: Some(value) } => writeln!(f, " = {:?}", value),
            TokenKind::Leaf { value: None } => writeln!(f, " = <incomplete>"),
        }
    }
}

/// Renders the token tree as an indented outline, one token per line.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_outline(f, 0)
    }
}

/// One or more children sharing a tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    One(Token),
    Many(Vec<Token>),
}

impl Child {
    pub fn as_slice(&self) -> &[Token] {
        match self {
            Child::One(token) => core::slice::from_ref(token),
            Child::Many(tokens) => tokens,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, token: Token) {
        match self {
            Child::Many(tokens) => tokens.push(token),
            Child::One(_) => {
                let placeholder = Child::Many(Vec::with_capacity(2));
                if let Child::One(first) = core::mem::replace(self, placeholder) {
                    *self = Child::Many(vec![first, token]);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    order: usize,
    name: String,
    child: Child,
}

/// Ordered multimap from child tag name to [`Child`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    entries: Vec<Entry>,
}

impl Children {
    /// Insert a token, promoting an existing single entry to a list.
    pub fn insert(&mut self, order: usize, token: Token) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == token.name) {
            entry.child.push(token);
            return;
        }

        let at = self
            .entries
            .iter()
            .position(|e| e.order > order)
            .unwrap_or(self.entries.len());
        self.entries.insert(
            at,
            Entry {
                order,
                name: token.name.clone(),
                child: Child::One(token),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Child> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.child)
    }

    /// Tag names in output order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Every child token with its tag name, entry by entry.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Token)> {
        self.entries
            .iter()
            .flat_map(|e| e.child.as_slice().iter().map(move |t| (e.name.as_str(), t)))
    }

    /// Number of distinct tag names.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
