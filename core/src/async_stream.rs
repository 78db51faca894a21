//! Async streaming drivers.
//!
//! The matcher itself is synchronous; these drivers pull chunks from an async
//! byte source and feed them to a [`ParseSession`](crate::ParseSession) one at
//! a time. A chunk is fully scanned before the next one is requested, so the
//! source sees natural backpressure.
//!
//! # Features
//!
//! - **`futures`**: [`Parser::parse_stream`] over any `Stream` of chunks,
//!   independent of the runtime
//! - **`tokio`**: [`Parser::parse_channel`] over an `mpsc::Receiver` and
//!   [`Parser::parse_reader`] over an `AsyncRead`, both honoring
//!   [`ParseConfig::timeout`](crate::ParseConfig::timeout)
//!
//! Dropping the returned future cancels the parse. Nothing is produced until
//! the stream has ended, so no partial result is ever observable.
//!
//! # Example
//!
//! ```ignore
//! use hoap::{Parser, WatchedTags};
//! use tokio::sync::mpsc;
//!
//! async fn extract(tags: &WatchedTags, mut body: impl tokio::io::AsyncRead + Unpin) {
//!     let parser = Parser::new(tags).unwrap();
//!     let doc = parser.parse_reader(&mut body).await.unwrap();
//!     println!("{}", doc);
//! }
//! ```

use crate::error::BoxError;
use crate::{Error, Parser, Result, Token};

#[cfg(feature = "tokio")]
pub mod tokio_impl {
    //! Tokio-based drivers.

    use super::*;
    use ::tokio::io::{AsyncRead, AsyncReadExt};
    use ::tokio::sync::mpsc;
    use core::future::Future;
    use core::time::Duration;

    impl Parser {
        /// Parse chunks received from a channel.
        ///
        /// The stream ends when every sender has been dropped. An `Err` item
        /// aborts the parse with [`Error::Source`].
        pub async fn parse_channel<B, E>(&self, mut rx: mpsc::Receiver<Result<B, E>>) -> Result<Token>
        where
            B: AsRef<[u8]>,
            E: Into<BoxError>,
        {
            let parse = async {
                let mut session = self.session();
                while let Some(chunk) = rx.recv().await {
                    let chunk = chunk.map_err(Error::from_source)?;
                    session.feed(chunk.as_ref())?;
                }
                session.finish()
            };
            with_timeout(self.config().timeout, parse).await
        }

        /// Parse everything read from `reader` until it reports end of file.
        ///
        /// Reads at most [`ParseConfig::read_buffer_size`](crate::ParseConfig)
        /// bytes at a time.
        pub async fn parse_reader<R>(&self, mut reader: R) -> Result<Token>
        where
            R: AsyncRead + Unpin,
        {
            let parse = async {
                let mut session = self.session();
                let mut buf = vec![0u8; self.config().read_buffer_size.max(1)];
                loop {
                    let n = reader.read(&mut buf).await?;
                    if n == 0 {
                        break;
                    }
                    session.feed(&buf[..n])?;
                }
                session.finish()
            };
            with_timeout(self.config().timeout, parse).await
        }
    }

    async fn with_timeout<F>(timeout: Option<Duration>, parse: F) -> Result<Token>
    where
        F: Future<Output = Result<Token>>,
    {
        match timeout {
            Some(limit) => ::tokio::time::timeout(limit, parse)
                .await
                .map_err(|_| Error::Timeout)?,
            None => parse.await,
        }
    }
}

#[cfg(feature = "futures")]
pub mod futures_impl {
    //! Futures-based driver (runtime-agnostic).

    use super::*;
    use core::future::poll_fn;
    use core::pin::Pin;
    use futures_core::Stream;

    impl Parser {
        /// Parse chunks yielded by `stream`.
        ///
        /// An `Err` item aborts the parse with [`Error::Source`]. No timeout is
        /// applied; wrap the future with the runtime's own timer if needed.
        pub async fn parse_stream<S, B, E>(&self, mut stream: S) -> Result<Token>
        where
            S: Stream<Item = Result<B, E>> + Unpin,
            B: AsRef<[u8]>,
            E: Into<BoxError>,
        {
            let mut session = self.session();
            while let Some(chunk) = next(&mut stream).await {
                let chunk = chunk.map_err(Error::from_source)?;
                session.feed(chunk.as_ref())?;
            }
            session.finish()
        }
    }

    async fn next<S>(stream: &mut S) -> Option<S::Item>
    where
        S: Stream + Unpin,
    {
        poll_fn(|cx| Pin::new(&mut *stream).poll_next(cx)).await
    }
}
