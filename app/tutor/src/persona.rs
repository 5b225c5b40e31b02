//! Conversation phases and the persona serving each one.

use compact_str::CompactString;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Stage of a tutoring session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Learn who the student is and what they need.
    #[default]
    Triage,
    Tutoring,
    Assessment,
    Feedback,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Triage,
        Phase::Tutoring,
        Phase::Assessment,
        Phase::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Triage => "triage",
            Self::Tutoring => "tutoring",
            Self::Assessment => "assessment",
            Self::Feedback => "feedback",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triage" => Ok(Self::Triage),
            "tutoring" | "tutor" => Ok(Self::Tutoring),
            "assessment" | "assess" => Ok(Self::Assessment),
            "feedback" => Ok(Self::Feedback),
            other => anyhow::bail!("unknown phase '{other}'"),
        }
    }
}

/// A named set of instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Display name.
    pub name: CompactString,
    /// System instructions sent with every call in this phase.
    pub instructions: String,
}

impl Persona {
    pub fn new(name: impl Into<CompactString>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }
}

/// One persona per phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personas {
    pub triage: Persona,
    pub tutoring: Persona,
    pub assessment: Persona,
    pub feedback: Persona,
}

impl Personas {
    pub fn get(&self, phase: Phase) -> &Persona {
        match phase {
            Phase::Triage => &self.triage,
            Phase::Tutoring => &self.tutoring,
            Phase::Assessment => &self.assessment,
            Phase::Feedback => &self.feedback,
        }
    }
}

const HANDOFF_NOTE: &str = "When the student is ready for another stage, call the `handoff` \
tool with the phase to move to instead of announcing it.";

impl Default for Personas {
    fn default() -> Self {
        Self {
            triage: Persona::new(
                "Olivia",
                format!(
                    "You are Olivia, a friendly teaching assistant. Learn the student's name, \
                     grade, subject and goals with short questions. Once you know what they \
                     want to study, hand off to `tutoring`. {HANDOFF_NOTE}"
                ),
            ),
            tutoring: Persona::new(
                "Tutor",
                format!(
                    "You are a patient tutor. Teach step by step, check understanding often \
                     and use the course tools to ground your explanations. Hand off to \
                     `assessment` when the student wants to be tested and to `feedback` \
                     when they ask how they are doing. {HANDOFF_NOTE}"
                ),
            ),
            assessment: Persona::new(
                "Assessor",
                format!(
                    "You write short quizzes on the topic just covered, one question at a \
                     time, and grade each answer with a brief explanation. Hand off to \
                     `feedback` when the quiz is over. {HANDOFF_NOTE}"
                ),
            ),
            feedback: Persona::new(
                "Feedback",
                format!(
                    "You review the student's progress in this conversation. Be encouraging \
                     and specific: name strengths, gaps and next steps. Hand off to \
                     `tutoring` when the student wants to keep learning. {HANDOFF_NOTE}"
                ),
            ),
        }
    }
}
