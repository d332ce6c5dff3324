//! Event sources.
//!
//! The caller states up front whether it has one finished value or an ongoing
//! producer. Streaming sources are pulled one item at a time, so a source is
//! never asked for a value before the previous frame was accepted by the sink.

use std::convert::Infallible;
use std::fmt;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// A single value or a stream of values to emit.
pub enum EventSource<T, E = Infallible> {
    /// One finished value
    Single(T),
    /// An ongoing producer; an `Err` item ends the response
    Stream(BoxStream<'static, Result<T, E>>),
}

impl<T, E> EventSource<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Emit one value.
    pub fn single(value: T) -> Self {
        Self::Single(value)
    }

    /// Emit every item of a fallible stream.
    pub fn stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
    {
        Self::Stream(stream.boxed())
    }

    /// Returns `true` for streaming sources.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Stream(_))
    }
}

impl<T: Send + 'static> EventSource<T, Infallible> {
    /// Emit every item of an infallible stream.
    pub fn infallible<S>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        Self::Stream(stream.map(Ok).boxed())
    }

    /// Emit values pushed into a bounded channel, ending when every sender is
    /// dropped.
    ///
    /// A full channel makes producers wait, which is how a slow client slows
    /// a push-based producer down.
    pub fn from_receiver(receiver: mpsc::Receiver<T>) -> Self {
        Self::infallible(ReceiverStream::new(receiver))
    }

    /// Emit the items of an iterator.
    pub fn iter<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::infallible(stream::iter(items))
    }
}

impl<T, E> fmt::Debug for EventSource<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(_) => f.write_str("EventSource::Single(..)"),
            Self::Stream(_) => f.write_str("EventSource::Stream(..)"),
        }
    }
}
