//! Scripted backends and benchmarks for router tests.

#![allow(dead_code)]

use anyhow::Result;
use futures_core::Stream;
use haka_router::{
    Benchmark, DegradePolicy, HybridRouter, NetworkProbe, RouterConfig, Sample,
};
use llm::{
    Choice, Delta, FinishReason, FunctionCall, General, LLM, Message, Response, Role,
    StreamChunk, ToolCall,
};
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc, time::Duration};

/// What a scripted backend does on one stream call.
#[derive(Clone, Debug)]
pub enum Turn {
    /// Stream these fragments and stop.
    Text(Vec<&'static str>),
    /// Stream these fragments, then fail.
    Fail(Vec<&'static str>),
    /// Stream these fragments, then go silent without closing.
    Stall(Vec<&'static str>),
    /// Call a tool.
    Tool {
        name: &'static str,
        arguments: &'static str,
    },
}

#[derive(Default)]
struct Script {
    queued: VecDeque<Turn>,
    fallback: Option<Turn>,
    ping_ok: bool,
    stream_calls: usize,
    pings: usize,
    configs: Vec<General>,
    requests: Vec<Vec<Message>>,
}

/// A backend that follows a script and records what it was asked.
#[derive(Clone)]
pub struct Scripted {
    name: &'static str,
    script: Arc<Mutex<Script>>,
}

impl Scripted {
    /// Always answers with `fragments`; health checks pass.
    pub fn healthy(name: &'static str, fragments: Vec<&'static str>) -> Self {
        Self::with(name, Turn::Text(fragments), true)
    }

    /// Always fails before producing anything; health checks fail.
    pub fn failing(name: &'static str) -> Self {
        Self::with(name, Turn::Fail(Vec::new()), false)
    }

    pub fn with(name: &'static str, fallback: Turn, ping_ok: bool) -> Self {
        Self {
            name,
            script: Arc::new(Mutex::new(Script {
                fallback: Some(fallback),
                ping_ok,
                ..Default::default()
            })),
        }
    }

    /// Queue a one-off behavior for the next stream call.
    pub fn push(&self, turn: Turn) {
        self.script.lock().queued.push_back(turn);
    }

    pub fn set_ping(&self, ok: bool) {
        self.script.lock().ping_ok = ok;
    }

    pub fn set_fallback(&self, turn: Turn) {
        self.script.lock().fallback = Some(turn);
    }

    pub fn stream_calls(&self) -> usize {
        self.script.lock().stream_calls
    }

    pub fn pings(&self) -> usize {
        self.script.lock().pings
    }

    pub fn last_config(&self) -> Option<General> {
        self.script.lock().configs.last().cloned()
    }

    pub fn last_request(&self) -> Vec<Message> {
        self.script.lock().requests.last().cloned().unwrap_or_default()
    }

    fn next_turn(&self, config: General, messages: &[Message]) -> Turn {
        let mut script = self.script.lock();
        script.stream_calls += 1;
        script.configs.push(config);
        script.requests.push(messages.to_vec());
        script
            .queued
            .pop_front()
            .or_else(|| script.fallback.clone())
            .unwrap_or(Turn::Fail(Vec::new()))
    }
}

fn tool_chunk(name: &str, arguments: &str) -> StreamChunk {
    StreamChunk::tool(&[ToolCall {
        id: "call_0".into(),
        index: 0,
        call_type: "function".into(),
        function: FunctionCall {
            name: name.into(),
            arguments: arguments.into(),
        },
    }])
}

impl LLM for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, _config: &General, _messages: &[Message]) -> Result<Response> {
        if !self.script.lock().ping_ok {
            anyhow::bail!("{} unreachable", self.name);
        }
        Ok(Response {
            choices: vec![Choice {
                delta: Delta {
                    role: Some(Role::Assistant),
                    content: Some("ok".into()),
                    tool_calls: None,
                },
                finish_reason: Some(FinishReason::Stop),
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    fn stream(
        &self,
        config: General,
        messages: &[Message],
    ) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let turn = self.next_turn(config, messages);
        let name = self.name;
        async_stream::stream! {
            match turn {
                Turn::Text(fragments) => {
                    for fragment in fragments {
                        yield Ok(StreamChunk::text(fragment));
                    }
                    yield Ok(StreamChunk::finish(FinishReason::Stop));
                }
                Turn::Fail(fragments) => {
                    for fragment in fragments {
                        yield Ok(StreamChunk::text(fragment));
                    }
                    yield Err(anyhow::anyhow!("{name}: connection reset"));
                }
                Turn::Stall(fragments) => {
                    for fragment in fragments {
                        yield Ok(StreamChunk::text(fragment));
                    }
                    std::future::pending::<()>().await;
                }
                Turn::Tool { name, arguments } => {
                    yield Ok(tool_chunk(name, arguments));
                    yield Ok(StreamChunk::finish(FinishReason::ToolCalls));
                }
            }
        }
    }

    async fn ping(&self) -> Result<()> {
        let mut script = self.script.lock();
        script.pings += 1;
        if script.ping_ok {
            Ok(())
        } else {
            anyhow::bail!("{} health check failed", self.name)
        }
    }
}

/// A benchmark reporting whatever speed the test sets. Zero means the
/// download fails.
#[derive(Clone, Default)]
pub struct Network {
    speed: Arc<Mutex<f64>>,
    elapsed: Arc<Mutex<Option<Duration>>>,
    fetches: Arc<Mutex<usize>>,
}

impl Network {
    pub fn at(speed_mbps: f64) -> Self {
        let network = Self::default();
        network.set(speed_mbps);
        network
    }

    pub fn set(&self, speed_mbps: f64) {
        *self.speed.lock() = speed_mbps;
    }

    /// Report this elapsed time instead of one second.
    pub fn set_elapsed(&self, elapsed: Duration) {
        *self.elapsed.lock() = Some(elapsed);
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock()
    }
}

impl Benchmark for Network {
    async fn fetch(&self) -> Result<Sample> {
        *self.fetches.lock() += 1;
        let speed = *self.speed.lock();
        if speed <= 0.0 {
            anyhow::bail!("dns error: benchmark host unreachable");
        }
        let elapsed = self.elapsed.lock().unwrap_or(Duration::from_secs(1));
        Ok(Sample {
            bytes: (speed * 125_000.0) as u64,
            elapsed,
        })
    }
}

pub fn probe(network: &Network) -> NetworkProbe<Network> {
    NetworkProbe::new(
        network.clone(),
        Duration::from_secs(10),
        Duration::from_secs(30),
    )
}

pub fn router(
    remote: Option<Scripted>,
    local: Scripted,
    network: &Network,
) -> HybridRouter<Scripted, Scripted, Network> {
    HybridRouter::new(
        remote,
        local,
        probe(network),
        DegradePolicy::default(),
        RouterConfig::default(),
    )
}
