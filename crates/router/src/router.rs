//! Per-turn backend selection with fallback and recovery.

use crate::{
    DegradePolicy, Error, GenerationProfile, Result, Tier, Toolbox, Transcript,
    config::RouterConfig,
    probe::{Benchmark, HttpBenchmark, NetworkMeasurement, NetworkProbe},
    toolbox::MAX_TOOL_ROUNDS,
};
use async_stream::{stream, try_stream};
use compact_str::CompactString;
use futures_core::Stream;
use futures_util::{StreamExt, pin_mut};
use llm::{General, LLM, Message, Role};
use std::{fmt, time::Duration};
use tokio::time::Instant;

/// Reply text when neither backend could answer.
pub const APOLOGY: &str =
    "I apologize, but I'm experiencing technical difficulties. Please try again.";

/// Which backend serves a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Remote,
    Local,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Remote => "remote",
            Self::Local => "local",
        })
    }
}

/// Routing state of one session.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterState {
    pub active_backend: Backend,
    pub last_probe: Option<NetworkMeasurement>,
    pub consecutive_remote_failures: u32,
}

/// Per-call instructions and tools.
///
/// The instructions go out as a leading system message on every backend
/// call and are never written to the transcript.
#[derive(Clone, Copy)]
pub struct Prompt<'a> {
    instructions: &'a str,
    tools: Option<&'a Toolbox>,
}

impl<'a> Prompt<'a> {
    pub fn new(instructions: &'a str) -> Self {
        Self {
            instructions,
            tools: None,
        }
    }

    /// Offer these tools to the model.
    pub fn with_tools(mut self, tools: &'a Toolbox) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn instructions(&self) -> &str {
        self.instructions
    }

    fn config(&self, profile: &GenerationProfile) -> General {
        let general = profile.general();
        match self.tools {
            Some(tools) => general.with_tools(tools.tools()),
            None => general,
        }
    }

    fn messages(&self, history: &[Message], pending: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + pending.len() + 1);
        if !self.instructions.is_empty() {
            messages.push(Message::system(self.instructions));
        }
        messages.extend_from_slice(history);
        messages.extend_from_slice(pending);
        messages
    }

    async fn dispatch(&self, calls: &[llm::ToolCall]) -> Vec<Message> {
        match self.tools {
            Some(tools) => tools.dispatch(calls).await,
            None => Toolbox::default().dispatch(calls).await,
        }
    }
}

/// Progress of a turn, in order.
#[derive(Debug)]
pub enum TurnEvent {
    /// A backend was chosen.
    Route {
        backend: Backend,
        tier: Tier,
        profile: GenerationProfile,
        speed_mbps: f64,
    },
    /// Generated text, in generation order.
    Fragment(String),
    /// The model called a tool.
    ToolCall { name: CompactString },
    /// Remote failed; text streamed so far is void and local takes over.
    Fallback { error: String },
    /// The turn is over.
    Done(Reply),
}

/// The outcome of a turn.
#[derive(Debug)]
pub struct Reply {
    pub text: String,
    pub backend: Backend,
    pub profile: GenerationProfile,
    /// `Err(BothBackendsFailed)` when `text` is the apology.
    pub outcome: Result<()>,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Routes turns between a remote and a local backend.
///
/// Owns the session transcript and routing state. One router per session;
/// only the probe may be shared.
pub struct HybridRouter<R, L, B = HttpBenchmark> {
    remote: Option<R>,
    local: L,
    probe: NetworkProbe<B>,
    policy: DegradePolicy,
    config: RouterConfig,
    transcript: Transcript,
    state: RouterState,
    /// Earliest time for the next recovery check; `None` means now.
    next_health_check: Option<Instant>,
}

impl<R: LLM, L: LLM, B: Benchmark> HybridRouter<R, L, B> {
    /// Create a router. Starts on remote when one is configured.
    pub fn new(
        remote: Option<R>,
        local: L,
        probe: NetworkProbe<B>,
        policy: DegradePolicy,
        config: RouterConfig,
    ) -> Self {
        let active_backend = if remote.is_some() {
            Backend::Remote
        } else {
            Backend::Local
        };
        tracing::info!("router starting on {active_backend} backend");
        Self {
            remote,
            local,
            probe,
            policy,
            config,
            transcript: Transcript::new(),
            state: RouterState {
                active_backend,
                last_probe: None,
                consecutive_remote_failures: 0,
            },
            next_health_check: None,
        }
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn policy(&self) -> &DegradePolicy {
        &self.policy
    }

    pub fn probe(&self) -> &NetworkProbe<B> {
        &self.probe
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Run one turn, streaming its progress.
    ///
    /// The user turn is appended first. Assistant output is committed only
    /// once a backend finishes; dropping the stream early commits nothing.
    /// Always ends with [`TurnEvent::Done`].
    pub fn stream<'a>(
        &'a mut self,
        prompt: Prompt<'a>,
        input: &'a str,
    ) -> impl Stream<Item = TurnEvent> + Send + 'a {
        stream! {
            self.transcript.push_user(input);
            let measurement = self.probe.measure(self.config.force_probe_each_turn).await;
            self.state.last_probe = Some(measurement);
            let speed_mbps = measurement.speed_mbps;
            let tier = self.policy.tier(speed_mbps);
            let backend = self.route(tier).await;

            let mut remote_error = None;
            if let (Backend::Remote, Some(remote)) = (backend, self.remote.as_ref()) {
                let profile = self.policy.profile(tier);
                tracing::debug!("turn on remote ({tier}, {speed_mbps:.2} Mbps)");
                yield TurnEvent::Route { backend, tier, profile, speed_mbps };

                let mut result = Err(anyhow::anyhow!("remote produced no reply"));
                {
                    let steps = attempt(
                        remote,
                        self.transcript.messages(),
                        prompt,
                        prompt.config(&profile),
                        self.config.generation_timeout(),
                    );
                    pin_mut!(steps);
                    while let Some(step) = steps.next().await {
                        match step {
                            Ok(Step::Event(event)) => yield event,
                            Ok(Step::Finished { turn, text }) => result = Ok((turn, text)),
                            Err(e) => result = Err(e),
                        }
                    }
                }

                match result {
                    Ok((turn, text)) => {
                        self.transcript.commit(turn);
                        self.state.consecutive_remote_failures = 0;
                        yield TurnEvent::Done(Reply {
                            text,
                            backend,
                            profile,
                            outcome: Ok(()),
                        });
                        return;
                    }
                    Err(e) => {
                        let error = Error::unavailable(Backend::Remote, e).to_string();
                        tracing::warn!("{error}; retrying turn on local");
                        self.fall_back();
                        yield TurnEvent::Fallback { error: error.clone() };
                        remote_error = Some(error);
                    }
                }
            }

            let profile = self.policy.profile(Tier::Offline);
            tracing::debug!("turn on local ({tier}, {speed_mbps:.2} Mbps)");
            yield TurnEvent::Route {
                backend: Backend::Local,
                tier,
                profile,
                speed_mbps,
            };

            let mut result = Err(anyhow::anyhow!("local produced no reply"));
            {
                let steps = attempt(
                    &self.local,
                    self.transcript.messages(),
                    prompt,
                    prompt.config(&profile),
                    self.config.generation_timeout(),
                );
                pin_mut!(steps);
                while let Some(step) = steps.next().await {
                    match step {
                        Ok(Step::Event(event)) => yield event,
                        Ok(Step::Finished { turn, text }) => result = Ok((turn, text)),
                        Err(e) => result = Err(e),
                    }
                }
            }

            let reply = match result {
                Ok((turn, text)) => {
                    self.transcript.commit(turn);
                    Reply {
                        text,
                        backend: Backend::Local,
                        profile,
                        outcome: Ok(()),
                    }
                }
                Err(e) => {
                    let error = Error::BothBackendsFailed {
                        remote: remote_error,
                        local: e.to_string(),
                    };
                    tracing::error!("{error}");
                    Reply {
                        text: APOLOGY.to_owned(),
                        backend: Backend::Local,
                        profile,
                        outcome: Err(error),
                    }
                }
            };
            yield TurnEvent::Done(reply);
        }
    }

    /// Run one turn and return its reply.
    pub async fn chat(&mut self, prompt: Prompt<'_>, input: &str) -> Reply {
        let events = self.stream(prompt, input);
        pin_mut!(events);
        let mut reply = None;
        while let Some(event) = events.next().await {
            if let TurnEvent::Done(done) = event {
                reply = Some(done);
            }
        }

        reply.unwrap_or_else(|| Reply {
            text: APOLOGY.to_owned(),
            backend: Backend::Local,
            profile: GenerationProfile::OFFLINE,
            outcome: Err(Error::BothBackendsFailed {
                remote: None,
                local: "turn ended without a reply".into(),
            }),
        })
    }

    /// Run a one-off exchange outside the session transcript.
    ///
    /// Uses the active backend and the last probe without probing again.
    /// A remote failure still falls back to local and updates the state.
    pub async fn complete_detached(&mut self, prompt: Prompt<'_>, input: &str) -> Result<String> {
        let history = [Message::user(input)];
        let idle = self.config.generation_timeout();
        let tier = self
            .state
            .last_probe
            .map_or(Tier::Full, |probe| self.policy.tier(probe.speed_mbps));

        let mut remote_error = None;
        if self.state.active_backend == Backend::Remote && tier != Tier::Offline {
            if let Some(remote) = &self.remote {
                let profile = self.policy.profile(tier);
                let steps = attempt(remote, &history, prompt, prompt.config(&profile), idle);
                match drain(steps).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        let error = Error::unavailable(Backend::Remote, e).to_string();
                        tracing::warn!("{error}; retrying detached call on local");
                        remote_error = Some(error);
                        self.fall_back();
                    }
                }
            }
        }

        let profile = self.policy.profile(Tier::Offline);
        drain(attempt(&self.local, &history, prompt, prompt.config(&profile), idle))
            .await
            .map_err(|e| Error::BothBackendsFailed {
                remote: remote_error,
                local: e.to_string(),
            })
    }

    /// Pick the backend for a turn, updating state.
    async fn route(&mut self, tier: Tier) -> Backend {
        if self.remote.is_none() {
            return Backend::Local;
        }
        if tier == Tier::Offline {
            if self.state.active_backend == Backend::Remote {
                tracing::info!("network offline, switching to local backend");
                self.state.active_backend = Backend::Local;
            }
            return Backend::Local;
        }

        if self.state.active_backend == Backend::Remote {
            return Backend::Remote;
        }
        if tier == Tier::Full && self.check_remote().await {
            Backend::Remote
        } else {
            Backend::Local
        }
    }

    /// Rate-limited remote recovery check. Switches to remote on success.
    async fn check_remote(&mut self) -> bool {
        let Some(remote) = &self.remote else {
            return false;
        };
        if self.next_health_check.is_some_and(|at| Instant::now() < at) {
            tracing::trace!("remote health check not due");
            return false;
        }

        let healthy = match tokio::time::timeout(self.config.health_check_timeout(), remote.ping())
            .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::debug!("remote health check failed: {e}");
                false
            }
            Err(_) => {
                tracing::debug!("remote health check timed out");
                false
            }
        };

        if healthy {
            tracing::info!("remote backend recovered, switching to remote");
            self.state.active_backend = Backend::Remote;
            self.state.consecutive_remote_failures = 0;
            self.next_health_check = None;
        } else {
            self.state.consecutive_remote_failures += 1;
            let factor = 1u32 << (self.state.consecutive_remote_failures - 1).min(3);
            self.next_health_check =
                Some(Instant::now() + self.config.health_check_interval() * factor);
        }
        healthy
    }

    /// Switch to local after a remote failure. The next check is not delayed.
    fn fall_back(&mut self) {
        self.state.active_backend = Backend::Local;
        self.state.consecutive_remote_failures += 1;
        self.next_health_check = None;
    }
}

/// Output of one backend attempt.
enum Step {
    Event(TurnEvent),
    /// Everything the assistant produced, ready to commit.
    Finished { turn: Vec<Message>, text: String },
}

/// Stream one backend's answer, running tool rounds until it stops.
///
/// The history is never modified; tool calls and results accumulate in the
/// pending turn handed back by `Step::Finished`. Waiting longer than `idle`
/// for the next chunk fails the attempt.
fn attempt<'a, M: LLM>(
    backend: &'a M,
    history: &'a [Message],
    prompt: Prompt<'a>,
    config: General,
    idle: Duration,
) -> impl Stream<Item = anyhow::Result<Step>> + Send + 'a {
    try_stream! {
        let mut turn = Vec::new();
        let mut text = String::new();

        for _ in 0..MAX_TOOL_ROUNDS {
            let messages = prompt.messages(history, &turn);
            let mut builder = Message::builder(Role::Assistant);
            let mut finished = false;
            {
                let inner = backend.stream(config.clone(), &messages);
                pin_mut!(inner);
                loop {
                    let Some(chunk) = tokio::time::timeout(idle, inner.next())
                        .await
                        .map_err(|_| {
                            anyhow::anyhow!(
                                "{} sent nothing for {}s",
                                backend.name(),
                                idle.as_secs()
                            )
                        })?
                    else {
                        break;
                    };
                    let chunk = chunk?;
                    if let Some(fragment) = builder.accept(&chunk) {
                        text.push_str(fragment);
                        yield Step::Event(TurnEvent::Fragment(fragment.to_owned()));
                    }
                    if chunk.reason().is_some() {
                        finished = true;
                        break;
                    }
                }
            }
            if !finished {
                Err(anyhow::anyhow!("{} stream ended before completion", backend.name()))?;
            }

            let message = builder.build();
            if message.tool_calls.is_empty() {
                turn.push(message);
                yield Step::Finished { turn, text };
                return;
            }

            for call in &message.tool_calls {
                yield Step::Event(TurnEvent::ToolCall {
                    name: call.function.name.clone(),
                });
            }
            let results = prompt.dispatch(&message.tool_calls).await;
            turn.push(message);
            turn.extend(results);
        }

        Err(anyhow::anyhow!("tool call limit of {MAX_TOOL_ROUNDS} rounds reached"))?;
    }
}

/// Drain an attempt, discarding events.
async fn drain(steps: impl Stream<Item = anyhow::Result<Step>>) -> anyhow::Result<String> {
    pin_mut!(steps);
    while let Some(step) = steps.next().await {
        if let Step::Finished { text, .. } = step? {
            return Ok(text);
        }
    }
    anyhow::bail!("stream ended without a reply")
}
