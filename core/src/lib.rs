//! Streaming, configuration-driven XML tag extractor.
//!
//! Declare the tags you care about as a [`WatchedTags`] tree, compile it into a
//! [`Parser`], and feed the response body in chunks of any size. The result is
//! a [`Token`] tree holding only the watched tags, with absolute byte positions
//! and extracted text, identical for every way the input is split.

pub mod config;
mod error;
pub mod index;
pub mod instruction;
mod matcher;
mod parser;
pub mod token;
pub mod traverse;

#[cfg(any(feature = "tokio", feature = "futures"))]
pub mod async_stream;

pub use config::ParseConfig;
pub use error::{BoxError, Error, Result};
pub use index::{DOCUMENT_NAME, DOCUMENT_PATH};
pub use instruction::{InstructionNode, InstructionTree, NodeKind, WatchedTagNode, WatchedTags};
pub use matcher::ParseSession;
pub use parser::Parser;
pub use token::{Child, Children, Position, Token, TokenKind, UNRESOLVED};
