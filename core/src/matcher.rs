//! Chunk-boundary-safe streaming matcher.
//!
//! A [`ParseSession`] owns the bytes retained between chunks (the leftover),
//! the absolute offset of the first retained byte and one resume position per
//! instruction node. Every chunk is appended to the leftover and the whole
//! instruction tree is walked over it; each node scans forward from its own
//! resume position, so bytes kept for the benefit of one node are never
//! classified twice by another.
//!
//! # Retention
//!
//! After a chunk the leftover is cut at the earliest resume position. A node
//! with nothing pending keeps only the tail that could still hold the start of
//! one of its tags; a leaf whose closing tag is missing pins everything from
//! its opening tag; an opening tag whose `>` has not arrived is deferred.

use crate::config::ParseConfig;
use crate::index::ResultIndex;
use crate::instruction::{InstructionNode, InstructionTree};
use crate::token::{Position, Token};
use crate::traverse::{self, Visit};
use crate::{Error, Result};
use memchr::memmem::Finder;
use memchr::{memchr, memchr3};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An opening tag whose head was read up to its `>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag {
    /// Offset of `<`.
    pub start: usize,
    /// Offset of the terminating `>`.
    pub gt: usize,
    pub attribute: Option<String>,
    pub self_closing: bool,
}

/// Result of looking for the next opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OpenScan {
    NotFound,
    /// An opening tag starts here but its head is cut by the end of the buffer.
    Partial(usize),
    Found(OpenTag),
}

impl OpenScan {
    fn start(&self) -> Option<usize> {
        match self {
            OpenScan::NotFound => None,
            OpenScan::Partial(start) => Some(*start),
            OpenScan::Found(tag) => Some(tag.start),
        }
    }
}

/// Find the next opening tag for `finder` (`<name`) at or after `from`.
///
/// A match not followed by `>`, `/` or whitespace belongs to a longer tag name
/// and is skipped.
pub(crate) fn find_open(buf: &[u8], from: usize, finder: &Finder<'_>) -> OpenScan {
    let mut cursor = from;
    while let Some(i) = buf.get(cursor..).and_then(|rest| finder.find(rest)) {
        let start = cursor + i;
        let after = start + finder.needle().len();
        match buf.get(after) {
            None => return OpenScan::Partial(start),
            Some(b'>' | b'/' | b' ' | b'\t' | b'\r' | b'\n') => {}
            Some(_) => {
                cursor = after;
                continue;
            }
        }
        return match head_end(buf, after) {
            Some(gt) => {
                let (attribute, self_closing) = split_head(&buf[after..gt]);
                OpenScan::Found(OpenTag {
                    start,
                    gt,
                    attribute,
                    self_closing,
                })
            }
            None => OpenScan::Partial(start),
        };
    }
    OpenScan::NotFound
}

/// Offset of the first `>` at or after `from` that is outside quotes.
fn head_end(buf: &[u8], from: usize) -> Option<usize> {
    let mut at = from;
    loop {
        let i = at + memchr3(b'>', b'"', b'\'', buf.get(at..)?)?;
        match buf[i] {
            b'>' => return Some(i),
            quote => {
                let close = i + 1 + memchr(quote, &buf[i + 1..])?;
                at = close + 1;
            }
        }
    }
}

/// Raw attribute text and self-closing flag of a tag head.
fn split_head(raw: &[u8]) -> (Option<String>, bool) {
    let raw = raw.trim_ascii();
    let (raw, self_closing) = match raw.strip_suffix(b"/") {
        Some(rest) => (rest.trim_ascii_end(), true),
        None => (raw, false),
    };
    let attribute = (!raw.is_empty()).then(|| String::from_utf8_lossy(raw).into_owned());
    (attribute, self_closing)
}

#[inline]
fn offset(abs: usize) -> i64 {
    i64::try_from(abs).unwrap_or(i64::MAX)
}

/// First closing tag at or after a cursor, remembered while the cursor has not
/// passed it.
#[derive(Default)]
struct CloseCache {
    known: Option<Option<usize>>,
}

impl CloseCache {
    fn next(&mut self, buf: &[u8], from: usize, finder: &Finder<'_>) -> Option<usize> {
        match self.known {
            Some(None) => None,
            Some(Some(at)) if at >= from => Some(at),
            _ => {
                let found = buf
                    .get(from..)
                    .and_then(|rest| finder.find(rest))
                    .map(|i| from + i);
                self.known = Some(found);
                found
            }
        }
    }
}

/// Per-node scan state carried across chunks.
#[derive(Debug, Clone, Copy, Default)]
struct NodeState {
    /// Absolute offset this node resumes scanning from.
    resume: usize,
    /// Absolute offset of a leaf opening tag still waiting for its closing tag.
    stalled: Option<usize>,
}

/// Turns matches into tokens and files them in the result index.
#[derive(Debug)]
struct Assembler {
    index: ResultIndex,
    strict: bool,
}

impl Assembler {
    fn scan(&mut self, buf: &[u8], base: usize, state: &mut NodeState, visit: &Visit<'_>) -> Result<()> {
        let node = visit.node;
        let end = buf.len();
        let close_len = node.close_pattern().len();
        let tail = (node.open_pattern().len() + 1).max(close_len) - 1;

        let mut cursor = state.resume.saturating_sub(base).min(end);
        let mut closes = CloseCache::default();
        state.stalled = None;

        loop {
            let open = find_open(buf, cursor, node.open_finder());
            let close = closes.next(buf, cursor, node.close_finder());

            if let Some(close_at) = close {
                if open.start().is_none_or(|start| close_at < start) {
                    cursor = close_at + close_len;
                    self.close_pending(visit.path, base + cursor)?;
                    continue;
                }
            }

            let tag = match open {
                OpenScan::Found(tag) => tag,
                OpenScan::Partial(start) => {
                    trace!(path = visit.path, position = base + start, "opening tag deferred");
                    state.resume = base + start;
                    return Ok(());
                }
                OpenScan::NotFound => {
                    state.resume = base + cursor.max(end.saturating_sub(tail));
                    return Ok(());
                }
            };

            let content_start = tag.gt + 1;
            let open_at = offset(base + tag.start);

            if tag.self_closing {
                let position = Position::new(open_at, offset(base + content_start));
                self.emit(visit, make_token(node, position, Some(String::new()), tag.attribute))?;
                cursor = content_start;
                continue;
            }

            match closes.next(buf, content_start, node.close_finder()) {
                Some(close_at) => {
                    let close_end = close_at + close_len;
                    let position = Position::new(open_at, offset(base + close_end));
                    let value = node
                        .is_leaf()
                        .then(|| String::from_utf8_lossy(&buf[content_start..close_at]).into_owned());
                    self.emit(visit, make_token(node, position, value, tag.attribute))?;
                    cursor = close_end;
                }
                None if node.is_leaf() => {
                    debug!(path = visit.path, position = open_at, "leaf stalled");
                    state.resume = base + tag.start;
                    state.stalled = Some(base + tag.start);
                    return Ok(());
                }
                None => {
                    let position = Position::pending(open_at);
                    self.emit(visit, make_token(node, position, None, tag.attribute))?;
                    cursor = content_start;
                }
            }
        }
    }

    fn emit(&mut self, visit: &Visit<'_>, token: Token) -> Result<()> {
        let position = token.position;
        let id = self.index.insert(token, visit.ordinal);
        self.index.register(visit.path, id);

        if self.index.append(visit.path, id)?.is_some() {
            trace!(
                path = visit.path,
                open = position.open,
                close = position.close,
                "token emitted"
            );
            return Ok(());
        }

        if self.strict {
            return Err(Error::OrphanToken {
                path: visit.path.to_owned(),
                open: position.open,
            });
        }
        warn!(path = visit.path, open = position.open, "no enclosing parent, token dropped");
        Ok(())
    }

    fn close_pending(&mut self, path: &str, close: usize) -> Result<()> {
        let close = offset(close);
        if self.index.close_open(path, close).is_some() {
            trace!(path, close, "token closed");
            return Ok(());
        }

        if self.strict {
            return Err(Error::UnexpectedClose {
                path: path.to_owned(),
                close,
            });
        }
        warn!(path, close, "closing tag without pending opening tag ignored");
        Ok(())
    }
}

fn make_token(
    node: &InstructionNode,
    position: Position,
    value: Option<String>,
    attribute: Option<String>,
) -> Token {
    if node.is_leaf() {
        Token::leaf(node.original(), position, value)
    } else {
        Token::element(node.original(), position, attribute)
    }
}

/// State of one parse over a chunked byte stream.
///
/// Feed chunks in order with [`feed`](Self::feed), then call
/// [`finish`](Self::finish) once the stream has ended. A session that returned
/// an error must be discarded.
#[derive(Debug)]
pub struct ParseSession {
    tree: Arc<InstructionTree>,
    config: ParseConfig,
    buffer: Vec<u8>,
    base: usize,
    nodes: Vec<NodeState>,
    assembler: Assembler,
}

impl ParseSession {
    pub(crate) fn new(tree: Arc<InstructionTree>, config: ParseConfig) -> Self {
        let nodes = vec![NodeState::default(); tree.len()];
        Self {
            tree,
            config,
            buffer: Vec::new(),
            base: 0,
            nodes,
            assembler: Assembler {
                index: ResultIndex::new(),
                strict: config.strict,
            },
        }
    }

    /// Absolute number of bytes fed so far.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.buffer.len()
    }

    /// Number of bytes currently retained between chunks.
    #[inline]
    pub fn leftover_len(&self) -> usize {
        self.buffer.len()
    }

    /// Scan the next chunk of the stream.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.buffer.extend_from_slice(chunk);

        let Self {
            tree,
            config,
            buffer,
            base,
            nodes,
            assembler,
        } = self;
        let start = *base;
        let buf = buffer.as_slice();

        traverse::dfs(tree.root(), |visit| {
            assembler.scan(buf, start, &mut nodes[visit.ordinal], &visit)
        })?;

        let keep = nodes
            .iter()
            .map(|n| n.resume.saturating_sub(start))
            .min()
            .unwrap_or(buf.len())
            .min(buf.len());
        buffer.drain(..keep);
        *base += keep;

        trace!(
            offset = start,
            len = chunk.len(),
            leftover = buffer.len(),
            "chunk accepted"
        );

        if buffer.len() > config.max_leftover_bytes {
            return Err(Error::LeftoverOverflow {
                retained: buffer.len(),
                max: config.max_leftover_bytes,
            });
        }
        Ok(())
    }

    /// End the stream and assemble the result tree.
    ///
    /// Leaves whose closing tag never arrived are emitted as incomplete
    /// tokens. The returned token is the synthetic document token, whose
    /// `close` is the stream length.
    pub fn finish(self) -> Result<Token> {
        let Self {
            tree,
            config,
            buffer,
            base,
            nodes,
            mut assembler,
        } = self;
        let length = base + buffer.len();

        traverse::dfs(tree.root(), |visit| match nodes[visit.ordinal].stalled {
            Some(open) => {
                debug!(path = visit.path, open, "incomplete leaf at end of stream");
                let token = Token::leaf(visit.node.original(), Position::pending(offset(open)), None);
                assembler.emit(&visit, token)
            }
            None => Ok(()),
        })?;

        let index = &mut assembler.index;
        let document = index.document();
        index.set_close(document, offset(length));

        if config.strict {
            if let Some((path, position)) = index.first_unresolved() {
                return Err(Error::UnclosedTag {
                    path: path.to_owned(),
                    open: position.open,
                });
            }
        }

        debug!(
            length,
            tokens = index.len() - 1,
            pending = index.unresolved_count(),
            "stream finished"
        );
        Ok(assembler.index.into_token())
    }
}
