//! Multi-persona session on top of the hybrid router.
//!
//! The orchestrator owns one [`HybridRouter`] per session and picks the
//! persona for the current [`Phase`]. Personas move the session along by
//! calling the `handoff` tool; the requested phase is read back from the
//! committed turn, so a handoff made during a failed remote attempt never
//! takes effect. Replies can optionally be screened by a safety persona
//! through a detached exchange that leaves the transcript alone.
//!
//! Screening changes only what the student is shown. The transcript is
//! append-only, so a withheld reply stays in it as the assistant turn and
//! later turns still see it.

use crate::{
    config::SafetyConfig,
    mcp::McpServer,
    persona::{Persona, Personas, Phase},
};
use async_stream::stream;
use futures_core::Stream;
use futures_util::{StreamExt, pin_mut};
use llm::{LLM, Role, Tool};
use router::{Benchmark, HttpBenchmark, HybridRouter, Prompt, Reply, Toolbox, TurnEvent};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Name of the phase transition tool.
pub const HANDOFF_TOOL: &str = "handoff";

/// Request sent on the student's behalf when they ask for feedback.
pub const FEEDBACK_REQUEST: &str = "Please give me feedback on my learning progress, \
with encouragement and suggestions for improvement.";

#[derive(JsonSchema, Deserialize)]
struct HandoffArgs {
    /// The phase to move the session to.
    phase: Phase,
}

fn handoff_tool() -> Tool {
    Tool {
        name: HANDOFF_TOOL.into(),
        description: "Move the session to another phase: triage, tutoring, assessment \
            or feedback. Takes effect after your reply."
            .to_owned(),
        parameters: schemars::schema_for!(HandoffArgs),
        strict: true,
    }
}

/// The safety persona's judgement of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Warning,
    Blocked,
    /// No verdict could be read.
    Unknown,
}

impl Verdict {
    /// Read a `{"status": ...}` verdict, tolerating text around the JSON.
    pub fn parse(text: &str) -> Self {
        #[derive(Deserialize)]
        struct Status {
            status: String,
        }

        let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
            return Self::Unknown;
        };
        if end < start {
            return Self::Unknown;
        }
        match serde_json::from_str::<Status>(&text[start..=end]) {
            Ok(verdict) => match verdict.status.trim().to_ascii_lowercase().as_str() {
                "safe" => Self::Safe,
                "warning" => Self::Warning,
                "blocked" | "block" => Self::Blocked,
                _ => Self::Unknown,
            },
            Err(_) => Self::Unknown,
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }
}

/// The result of one student turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The reply as shown to the student.
    pub reply: Reply,
    /// Phase entered because of this turn.
    pub transition: Option<Phase>,
    /// Safety verdict, when screening ran.
    pub verdict: Option<Verdict>,
}

/// Progress of a session turn.
#[derive(Debug)]
pub enum SessionEvent {
    /// Router progress; never [`TurnEvent::Done`].
    Turn(TurnEvent),
    /// The turn is over.
    Outcome(TurnOutcome),
}

/// One tutoring session.
pub struct Orchestrator<R, L, B = HttpBenchmark> {
    router: HybridRouter<R, L, B>,
    phase: Phase,
    personas: Personas,
    tools: Toolbox,
    safety: Option<SafetyConfig>,
}

impl<R: LLM, L: LLM, B: Benchmark> Orchestrator<R, L, B> {
    /// Start a session in the triage phase.
    pub fn new(router: HybridRouter<R, L, B>, personas: Personas) -> Self {
        let mut tools = Toolbox::new();
        tools.register(handoff_tool(), |arguments| async move {
            match serde_json::from_str::<HandoffArgs>(&arguments) {
                Ok(args) => format!("handoff to {} recorded", args.phase),
                Err(e) => format!(
                    "error: {e}; phase must be one of triage, tutoring, assessment, feedback"
                ),
            }
        });
        Self {
            router,
            phase: Phase::default(),
            personas,
            tools,
            safety: None,
        }
    }

    /// Offer an MCP server's tools to every persona.
    pub fn with_mcp(mut self, server: &Arc<McpServer>) -> Self {
        server.register(&mut self.tools);
        self
    }

    /// Screen every reply with the safety persona.
    pub fn with_safety(mut self, safety: SafetyConfig) -> Self {
        self.safety = Some(safety);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The persona serving the current phase.
    pub fn persona(&self) -> &Persona {
        self.personas.get(self.phase)
    }

    pub fn router(&self) -> &HybridRouter<R, L, B> {
        &self.router
    }

    pub fn tools(&self) -> &Toolbox {
        &self.tools
    }

    /// Switch phase explicitly. Returns whether the phase changed.
    pub fn set_phase(&mut self, phase: Phase) -> bool {
        if self.phase == phase {
            return false;
        }
        tracing::info!("phase {} -> {phase}", self.phase);
        self.phase = phase;
        true
    }

    /// Run one student turn, streaming its progress.
    ///
    /// Ends with [`SessionEvent::Outcome`] unless dropped early.
    pub fn stream<'a>(&'a mut self, input: &'a str) -> impl Stream<Item = SessionEvent> + Send + 'a {
        stream! {
            let start = self.router.transcript().len();
            let prompt =
                Prompt::new(&self.personas.get(self.phase).instructions).with_tools(&self.tools);

            let mut reply = None;
            {
                let events = self.router.stream(prompt, input);
                pin_mut!(events);
                while let Some(event) = events.next().await {
                    match event {
                        TurnEvent::Done(done) => reply = Some(done),
                        event => yield SessionEvent::Turn(event),
                    }
                }
            }
            let Some(mut reply) = reply else {
                return;
            };

            let mut transition = None;
            let mut verdict = None;
            if reply.is_ok() {
                if let Some(phase) = self.requested_phase(start) {
                    if self.set_phase(phase) {
                        transition = Some(phase);
                    }
                }
                if let Some(safety) = &self.safety {
                    let screened = screen(&mut self.router, safety, &reply.text).await;
                    if !screened.is_safe() {
                        tracing::warn!("reply withheld by safety screen ({screened:?})");
                        reply.text = safety.replacement.clone();
                    }
                    verdict = Some(screened);
                }
            }

            yield SessionEvent::Outcome(TurnOutcome { reply, transition, verdict });
        }
    }

    /// Run one student turn.
    pub async fn turn(&mut self, input: &str) -> anyhow::Result<TurnOutcome> {
        let events = self.stream(input);
        pin_mut!(events);
        while let Some(event) = events.next().await {
            if let SessionEvent::Outcome(outcome) = event {
                return Ok(outcome);
            }
        }
        anyhow::bail!("turn ended without a reply")
    }

    /// The last valid handoff committed since transcript index `start`.
    fn requested_phase(&self, start: usize) -> Option<Phase> {
        self.router
            .transcript()
            .messages()
            .iter()
            .skip(start)
            .filter(|message| message.role == Role::Assistant)
            .flat_map(|message| message.tool_calls.iter())
            .filter(|call| call.function.name == HANDOFF_TOOL)
            .filter_map(|call| serde_json::from_str::<HandoffArgs>(&call.function.arguments).ok())
            .map(|args| args.phase)
            .last()
    }
}

/// Ask the safety persona about `text`. Failures count as [`Verdict::Unknown`].
async fn screen<R: LLM, L: LLM, B: Benchmark>(
    router: &mut HybridRouter<R, L, B>,
    safety: &SafetyConfig,
    text: &str,
) -> Verdict {
    let request = format!("Review this tutor reply:\n\n{text}");
    match router
        .complete_detached(Prompt::new(&safety.instructions), &request)
        .await
    {
        Ok(answer) => Verdict::parse(&answer),
        Err(e) => {
            tracing::warn!("safety screen failed: {e}");
            Verdict::Unknown
        }
    }
}
