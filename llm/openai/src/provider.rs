//! LLM trait implementation for the OpenAI-compatible backend.

use crate::OpenAI;
use anyhow::Result;
use futures_core::Stream;
use llm::{General, LLM, Message, Request, Response, StreamChunk};

impl LLM for OpenAI {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, config: &General, messages: &[Message]) -> Result<Response> {
        let body = Request::new(self.model.as_str(), config).messages(messages);
        self.http.send(&body).await
    }

    fn stream(
        &self,
        config: General,
        messages: &[Message],
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let body = Request::new(self.model.as_str(), &config)
            .messages(messages)
            .stream(config.usage);
        tracing::debug!("{} stream on {}", self.name, self.model);
        self.http.stream_sse(body)
    }
}
