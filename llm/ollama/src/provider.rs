//! LLM trait implementation for the Ollama backend.

use crate::{
    Ollama,
    wire::{ChatChunk, ChatRequest, Normalizer},
};
use anyhow::Result;
use async_stream::try_stream;
use futures_core::Stream;
use futures_util::{StreamExt, pin_mut};
use llm::{General, LLM, Message, Response, StreamChunk, reqwest::Method};

impl LLM for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn send(&self, config: &General, messages: &[Message]) -> Result<Response> {
        let body = ChatRequest::new(&self.model, &self.tuning, config, messages, false);
        tracing::trace!("request: {}", serde_json::to_string(&body)?);
        let text = self
            .client
            .request(Method::POST, self.chat_endpoint())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let chunk: ChatChunk = serde_json::from_str(&text)?;
        crate::wire::to_response(chunk)
    }

    fn stream(
        &self,
        config: General,
        messages: &[Message],
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let body = ChatRequest::new(&self.model, &self.tuning, &config, messages, true);
        if let Ok(body) = serde_json::to_string(&body) {
            tracing::trace!("request: {}", body);
        }
        let request = self
            .client
            .request(Method::POST, self.chat_endpoint())
            .json(&body);

        try_stream! {
            let response = request.send().await?.error_for_status()?;
            let lines = llm::lines(response.bytes_stream());
            pin_mut!(lines);
            let mut normalizer = Normalizer::default();
            while let Some(line) = lines.next().await {
                let line = line?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                tracing::trace!("chunk: {}", line);
                let chunk: ChatChunk = serde_json::from_str(line)?;
                let done = chunk.done;
                yield normalizer.accept(chunk)?;
                if done {
                    break;
                }
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        self.client
            .get(format!("{}/api/tags", self.base))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
