//! Parser entry points.
//!
//! A [`Parser`] holds a compiled instruction tree behind an `Arc` together with
//! a [`ParseConfig`]. It is cheap to clone and every parse runs in its own
//! [`ParseSession`], so one parser can serve any number of concurrent streams.

use crate::config::ParseConfig;
use crate::instruction::{InstructionTree, WatchedTags};
use crate::matcher::ParseSession;
use crate::token::Token;
use crate::Result;
use std::sync::Arc;

/// Compiled watched-tag configuration plus parse settings.
#[derive(Debug, Clone)]
pub struct Parser {
    tree: Arc<InstructionTree>,
    config: ParseConfig,
}

impl Parser {
    /// Compile `tags` with the default configuration.
    pub fn new(tags: &WatchedTags) -> Result<Self> {
        Ok(Self::from_tree(InstructionTree::build(tags)?))
    }

    /// Decode a JSON watched-tag document and compile it.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        Self::new(&WatchedTags::from_json(json)?)
    }

    pub fn from_tree(tree: InstructionTree) -> Self {
        Self {
            tree: Arc::new(tree),
            config: ParseConfig::DEFAULT,
        }
    }

    /// Replace the parse configuration.
    #[inline]
    pub fn with_config(mut self, config: ParseConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &ParseConfig {
        &self.config
    }

    #[inline]
    pub fn tree(&self) -> &InstructionTree {
        &self.tree
    }

    /// Start a new parse.
    pub fn session(&self) -> ParseSession {
        ParseSession::new(Arc::clone(&self.tree), self.config)
    }

    /// Parse a document held entirely in memory.
    pub fn parse_slice(&self, input: &[u8]) -> Result<Token> {
        let mut session = self.session();
        session.feed(input)?;
        session.finish()
    }

    /// Parse a document delivered as an ordered sequence of chunks.
    pub fn parse_chunks<I, B>(&self, chunks: I) -> Result<Token>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut session = self.session();
        for chunk in chunks {
            session.feed(chunk.as_ref())?;
        }
        session.finish()
    }
}
