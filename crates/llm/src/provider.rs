//! Provider abstractions for the unified chat interface

use crate::{General, Message, Response, StreamChunk};
use anyhow::Result;
use futures_core::Stream;

/// A trait for inference backends.
///
/// Constructors are inherent methods on each backend, never called
/// polymorphically. Implementations must not retry internally; callers
/// decide what a failure means.
pub trait LLM: Sized + Clone + Send + Sync {
    /// Human-readable backend name for logging
    fn name(&self) -> &str;

    /// Send a message to the LLM
    fn send(
        &self,
        config: &General,
        messages: &[Message],
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send a message to the LLM with streaming
    ///
    /// Each call is a fresh, one-shot stream. Errors are yielded in-band and
    /// end the stream.
    fn stream(
        &self,
        config: General,
        messages: &[Message],
    ) -> impl Stream<Item = Result<StreamChunk>> + Send;

    /// Minimal-cost health check.
    ///
    /// Defaults to a one-token completion.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send {
        async move {
            let config = General::default().with_max_tokens(1);
            self.send(&config, &[Message::user("test")]).await?;
            Ok(())
        }
    }
}
