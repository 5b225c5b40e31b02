//! Fake backends for session tests.

#![allow(dead_code)]

pub mod course;

use anyhow::Result;
use futures_core::Stream;
use haka_tutor::{Orchestrator, Personas};
use llm::{FinishReason, FunctionCall, General, LLM, Message, Response, StreamChunk, ToolCall};
use parking_lot::Mutex;
use router::{
    Benchmark, DegradePolicy, HybridRouter, NetworkProbe, RouterConfig, Sample,
};
use std::{collections::VecDeque, sync::Arc, time::Duration};

/// One scripted stream call.
#[derive(Clone, Debug)]
pub enum Step {
    Say(&'static str),
    Call(&'static str, &'static str),
    Fail,
}

/// Replays queued steps, then repeats a default reply.
#[derive(Clone)]
pub struct Script {
    name: &'static str,
    default: Step,
    queue: Arc<Mutex<VecDeque<Step>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl Script {
    pub fn new(name: &'static str, default: Step) -> Self {
        Self {
            name,
            default,
            queue: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn then(self, step: Step) -> Self {
        self.queue.lock().push_back(step);
        self
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }
}

impl LLM for Script {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, _config: &General, _messages: &[Message]) -> Result<Response> {
        anyhow::bail!("{} does not answer health checks", self.name)
    }

    fn stream(
        &self,
        _config: General,
        messages: &[Message],
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        self.requests.lock().push(messages.to_vec());
        let step = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        let name = self.name;
        async_stream::stream! {
            match step {
                Step::Say(text) => {
                    yield Ok(StreamChunk::text(text));
                    yield Ok(StreamChunk::finish(FinishReason::Stop));
                }
                Step::Call(tool, arguments) => {
                    yield Ok(StreamChunk::tool(&[ToolCall {
                        id: "call_0".into(),
                        index: 0,
                        call_type: "function".into(),
                        function: FunctionCall {
                            name: tool.into(),
                            arguments: arguments.into(),
                        },
                    }]));
                    yield Ok(StreamChunk::finish(FinishReason::ToolCalls));
                }
                Step::Fail => yield Err(anyhow::anyhow!("{name} unavailable")),
            }
        }
    }
}

/// A network that always measures the same speed.
pub struct Steady(pub f64);

impl Benchmark for Steady {
    async fn fetch(&self) -> Result<Sample> {
        if self.0 <= 0.0 {
            anyhow::bail!("offline");
        }
        Ok(Sample {
            bytes: (self.0 * 125_000.0) as u64,
            elapsed: Duration::from_secs(1),
        })
    }
}

pub fn session(remote: Script, local: Script, speed_mbps: f64) -> Orchestrator<Script, Script, Steady> {
    let probe = NetworkProbe::new(
        Steady(speed_mbps),
        Duration::from_secs(10),
        Duration::from_secs(30),
    );
    let router = HybridRouter::new(
        Some(remote),
        local,
        probe,
        DegradePolicy::default(),
        RouterConfig::default(),
    );
    Orchestrator::new(router, Personas::default())
}
