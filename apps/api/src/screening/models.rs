use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Prefix used when a turn is serialized into a generation prompt.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Candidate facts, filled in one field per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<f64>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Vec<String>,
}

impl CandidateProfile {
    /// Difficulty for technical questions. Missing experience counts as zero years.
    pub fn difficulty(&self) -> Difficulty {
        Difficulty::from_experience(self.experience.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// beginner below 2 years, intermediate below 5, advanced from 5 up.
    pub fn from_experience(years: f64) -> Self {
        if years < 2.0 {
            Difficulty::Beginner
        } else if years < 5.0 {
            Difficulty::Intermediate
        } else {
            Difficulty::Advanced
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answered question. Created when the message following the question arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub tech: String,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Partial,
}

/// The persisted, anonymized outcome of one session.
///
/// Name, email and phone only ever appear here as SHA-256 hex digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_hash: Option<String>,
    pub experience: Option<f64>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Vec<String>,
    pub answers: Vec<AnswerRecord>,
    pub completion_status: CompletionStatus,
    /// RFC 3339, UTC.
    pub timestamp: String,
}
