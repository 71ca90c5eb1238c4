use std::collections::VecDeque;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::screening::models::{AnswerRecord, CandidateProfile, ChatTurn, CompletionStatus};
use crate::screening::questions::{QuestionSet, QuestionSource};
use crate::screening::stage::Stage;

/// Number of answers shown in the end-of-session summary.
const SUMMARY_ANSWERS: usize = 5;

/// All state for one candidate conversation. Owned by exactly one conversation and
/// only ever mutated through `&mut`; sessions never share anything.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub stage: Stage,
    pub profile: CandidateProfile,
    /// Offset into `profile.tech_stack`.
    pub tech_index: usize,
    /// Question set for the current technology, generated lazily.
    pub questions: Option<QuestionSet>,
    /// How many questions of the current set have been asked.
    pub question_index: usize,
    pub answers: Vec<AnswerRecord>,
    pub ended: bool,
    /// Set exactly once, by finalization.
    pub completion_status: Option<CompletionStatus>,
    /// When the candidate last sent a message. Drives registry eviction.
    last_active: Instant,
    history: VecDeque<ChatTurn>,
    history_limit: usize,
}

impl Session {
    pub fn new(history_limit: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Greet,
            profile: CandidateProfile::default(),
            tech_index: 0,
            questions: None,
            question_index: 0,
            answers: Vec::new(),
            ended: false,
            completion_status: None,
            last_active: Instant::now(),
            // Grows on demand up to `history_limit`.
            history: VecDeque::new(),
            history_limit: history_limit.max(1),
        }
    }

    /// Appends to the bounded history, dropping the oldest turns past the limit.
    pub fn push_turn(&mut self, turn: ChatTurn) {
        self.history.push_back(turn);
        while self.history.len() > self.history_limit {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> Vec<ChatTurn> {
        self.history.iter().cloned().collect()
    }

    pub fn current_tech(&self) -> Option<&str> {
        self.profile.tech_stack.get(self.tech_index).map(String::as_str)
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn is_finalized(&self) -> bool {
        self.completion_status.is_some()
    }

    /// Position within the technical questions; `None` outside that stage.
    pub fn progress(&self, questions_per_tech: usize) -> Option<Progress> {
        if self.stage != Stage::TechQuestions {
            return None;
        }

        let technology_count = self.profile.tech_stack.len().max(1);
        let technology_number = self.tech_index + 1;
        let question_number = self.question_index.min(questions_per_tech);
        let total = (technology_count * questions_per_tech) as f64;
        let done = ((technology_number - 1) * questions_per_tech + question_number) as f64;

        Some(Progress {
            technology_number,
            technology_count,
            current_technology: self.current_tech().map(str::to_string),
            question_number,
            questions_per_technology: questions_per_tech,
            question_source: self.questions.as_ref().map(|q| q.source),
            overall: if total > 0.0 { done / total } else { 0.0 },
        })
    }

    /// Non-sensitive recap, available once the session has ended.
    pub fn summary(&self) -> Option<SessionSummary> {
        if !self.ended {
            return None;
        }

        Some(SessionSummary {
            experience_years: self.profile.experience,
            position: self.profile.position.clone(),
            location: self.profile.location.clone(),
            tech_stack: self.profile.tech_stack.clone(),
            answers: self.answers.iter().take(SUMMARY_ANSWERS).cloned().collect(),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Progress {
    pub technology_number: usize,
    pub technology_count: usize,
    pub current_technology: Option<String>,
    pub question_number: usize,
    pub questions_per_technology: usize,
    pub question_source: Option<QuestionSource>,
    pub overall: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub experience_years: Option<f64>,
    pub position: Option<String>,
    pub location: Option<String>,
    pub tech_stack: Vec<String>,
    pub answers: Vec<AnswerRecord>,
}
