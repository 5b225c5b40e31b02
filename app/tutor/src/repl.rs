//! Interactive tutoring REPL with streaming output and persistent history.

use crate::{
    orchestrator::{FEEDBACK_REQUEST, Orchestrator, SessionEvent},
    persona::Phase,
};
use anyhow::Result;
use futures_util::StreamExt;
use llm::LLM;
use router::{Benchmark, HttpBenchmark, TurnEvent};
use rustyline::error::ReadlineError;
use std::{io::Write, path::PathBuf, pin::pin};

/// A slash command typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    /// Switch phase; feedback also asks for a progress review.
    Switch(Phase),
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    /// Parse a line, or `None` if it is a message for the tutor.
    pub fn parse(line: &str) -> Option<Result<Self>> {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            return Some(Ok(Self::Quit));
        }
        let command = line.strip_prefix('/')?;
        Some(match command.trim() {
            "feedback" => Ok(Self::Switch(Phase::Feedback)),
            "assess" => Ok(Self::Switch(Phase::Assessment)),
            "tutor" => Ok(Self::Switch(Phase::Tutoring)),
            "triage" => Ok(Self::Switch(Phase::Triage)),
            "status" => Ok(Self::Status),
            "help" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(anyhow::anyhow!("unknown command /{other}, try /help")),
        })
    }
}

const HELP: &str = "\
/tutor     switch to the tutor
/assess    switch to assessment
/feedback  review progress so far
/triage    back to triage
/status    show phase and network state
/quit      leave (or Ctrl+D)";

/// Interactive REPL over one session.
pub struct ChatRepl<R, L, B = HttpBenchmark> {
    session: Orchestrator<R, L, B>,
    editor: rustyline::DefaultEditor,
    history_path: Option<PathBuf>,
}

impl<R: LLM, L: LLM, B: Benchmark> ChatRepl<R, L, B> {
    pub fn new(session: Orchestrator<R, L, B>) -> Result<Self> {
        let mut editor = rustyline::DefaultEditor::new()?;
        let history_path = history_file_path();
        if let Some(ref path) = history_path {
            let _ = editor.load_history(path);
        }
        Ok(Self {
            session,
            editor,
            history_path,
        })
    }

    /// Run the interactive loop.
    pub async fn run(&mut self) -> Result<()> {
        println!("Haka tutor (Ctrl+D to exit, Ctrl+C to cancel a reply, /help for commands)");
        println!("---");
        self.announce();

        loop {
            match self.editor.readline("You: ") {
                Ok(line) => {
                    let line = line.trim().to_owned();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(&line);
                    match ReplCommand::parse(&line) {
                        None => self.turn(&line).await,
                        Some(Ok(ReplCommand::Quit)) => break,
                        Some(Ok(ReplCommand::Help)) => println!("{HELP}"),
                        Some(Ok(ReplCommand::Status)) => self.status(),
                        Some(Ok(ReplCommand::Switch(phase))) => {
                            self.session.set_phase(phase);
                            self.announce();
                            if phase == Phase::Feedback {
                                self.turn(FEEDBACK_REQUEST).await;
                            }
                        }
                        Some(Err(e)) => eprintln!("{e}"),
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        self.save_history();
        Ok(())
    }

    fn announce(&self) {
        println!(
            "[{} phase with {}]",
            self.session.phase(),
            self.session.persona().name
        );
    }

    fn status(&self) {
        let router = self.session.router();
        let state = router.state();
        println!("phase:   {}", self.session.phase());
        println!("backend: {}", state.active_backend);
        match state.last_probe {
            Some(probe) => println!(
                "network: {:.2} Mbps ({})",
                probe.speed_mbps,
                router.policy().tier(probe.speed_mbps)
            ),
            None => println!("network: not measured yet"),
        }
        println!("turns:   {}", router.transcript().len());
    }

    /// Stream one turn to the terminal. Ctrl+C abandons it uncommitted.
    async fn turn(&mut self, input: &str) {
        let name = self.session.persona().name.clone();
        let mut transition = None;
        {
            let mut events = pin!(self.session.stream(input));
            print!("{name}: ");
            std::io::stdout().flush().ok();
            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(SessionEvent::Turn(TurnEvent::Fragment(text))) => {
                            print!("{text}");
                            std::io::stdout().flush().ok();
                        }
                        Some(SessionEvent::Turn(TurnEvent::Route { backend, tier, speed_mbps, .. })) => {
                            tracing::debug!("{backend} backend, {tier} network ({speed_mbps:.2} Mbps)");
                        }
                        Some(SessionEvent::Turn(TurnEvent::ToolCall { name })) => {
                            tracing::debug!("tool call: {name}");
                        }
                        Some(SessionEvent::Turn(TurnEvent::Fallback { error })) => {
                            eprintln!("\n[{error}; answering locally]");
                            print!("{name}: ");
                            std::io::stdout().flush().ok();
                        }
                        Some(SessionEvent::Turn(TurnEvent::Done(_))) => {}
                        Some(SessionEvent::Outcome(outcome)) => {
                            let screened = outcome.verdict.is_some_and(|verdict| !verdict.is_safe());
                            if !outcome.reply.is_ok() || screened {
                                print!("\n{}", outcome.reply.text);
                            }
                            transition = outcome.transition;
                        }
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        print!("\n[cancelled]");
                        break;
                    }
                }
            }
        }
        println!();

        if transition.is_some() {
            self.announce();
        }
    }

    fn save_history(&mut self) {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = self.editor.save_history(path);
        }
    }
}

/// `<config_dir>/haka/history`.
fn history_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(crate::config::CONFIG_DIR).join("history"))
}
