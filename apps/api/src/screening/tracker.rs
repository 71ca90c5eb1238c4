//! Progress tracker for the `tech_questions` stage.
//!
//! Outer loop: technologies in confirmed order. Inner loop: a fixed-size question set
//! per technology. The answer to question k is recorded when the *next* message
//! arrives, and switching technology costs one extra round trip: the new
//! technology's first question is only produced by the following call.

use tracing::{debug, warn};

use crate::llm_client::GenerationClient;
use crate::screening::finalizer::finalize;
use crate::screening::models::{AnswerRecord, CompletionStatus};
use crate::screening::questions::question_set_for;
use crate::screening::session::Session;
use crate::screening::store::RecordStore;

pub const SCREENING_COMPLETE: &str =
    "You've completed the technical screening! We'll be in touch soon.";

/// Runs one tracker step for `message` and returns the assistant reply.
pub async fn next_step(
    session: &mut Session,
    generator: &GenerationClient,
    store: &RecordStore,
    questions_per_tech: usize,
    message: &str,
) -> String {
    let Some(tech) = session.current_tech().map(str::to_string) else {
        warn!(
            "Session {} has no technology at index {}; completing",
            session.id, session.tech_index
        );
        finalize(session, CompletionStatus::Completed, store).await;
        return SCREENING_COMPLETE.to_string();
    };

    // 1. Record the answer to the previously asked question.
    if session.question_index > 0 && !message.trim().is_empty() {
        let asked = session
            .questions
            .as_ref()
            .and_then(|set| set.get(session.question_index - 1))
            .map(str::to_string);
        if let Some(question) = asked {
            session.answers.push(AnswerRecord {
                tech: tech.clone(),
                question,
                answer: message.to_string(),
            });
        }
    }

    // 2. Lazily source the question set for this technology.
    if session.questions.is_none() {
        let difficulty = session.profile.difficulty();
        let history = session.history();
        let set =
            question_set_for(generator, &tech, difficulty, questions_per_tech, &history).await;
        debug!(
            "Session {}: {} {:?} questions for {tech} ({difficulty})",
            session.id,
            set.len(),
            set.source
        );
        session.questions = Some(set);
        session.question_index = 0;
    }

    // 3. Ask the next question, if any remain.
    let total = session.questions.as_ref().map_or(0, |set| set.len());
    if session.question_index < total {
        let question = session
            .questions
            .as_ref()
            .and_then(|set| set.get(session.question_index))
            .unwrap_or_default()
            .to_string();
        session.question_index += 1;
        return format!(
            "Question {} of {} for {}:\n{}",
            session.question_index, total, tech, question
        );
    }

    // 4. Technology exhausted: move on, or finish.
    if session.tech_index + 1 < session.profile.tech_stack.len() {
        session.tech_index += 1;
        session.questions = None;
        session.question_index = 0;
        let next = session.current_tech().unwrap_or_default();
        format!("Done with {tech}! Now moving to {next}.")
    } else {
        finalize(session, CompletionStatus::Completed, store).await;
        SCREENING_COMPLETE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::questions::fallback_questions;
    use crate::screening::models::Difficulty;
    use crate::screening::stage::Stage;
    use std::time::Duration;

    fn fixture(techs: &[&str]) -> (Session, GenerationClient, RecordStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("records.json"));
        let generator = GenerationClient::new(None, 3, Duration::from_millis(1));
        let mut session = Session::new(10);
        session.stage = Stage::TechQuestions;
        session.profile.experience = Some(3.0);
        session.profile.tech_stack = techs.iter().map(|t| t.to_string()).collect();
        (session, generator, store, dir)
    }

    #[tokio::test]
    async fn test_first_call_asks_question_one() {
        let (mut session, generator, store, _dir) = fixture(&["Go", "Rust"]);
        let reply = next_step(&mut session, &generator, &store, 4, "").await;

        let expected = &fallback_questions("Go", Difficulty::Intermediate, 4)[0];
        assert_eq!(reply, format!("Question 1 of 4 for Go:\n{expected}"));
        assert_eq!(session.question_index, 1);
        assert!(session.answers.is_empty());
    }

    #[tokio::test]
    async fn test_answer_pairs_with_previous_question() {
        let (mut session, generator, store, _dir) = fixture(&["Go"]);
        next_step(&mut session, &generator, &store, 4, "").await;
        let reply = next_step(&mut session, &generator, &store, 4, "Channels").await;

        let bank = fallback_questions("Go", Difficulty::Intermediate, 4);
        assert!(reply.starts_with("Question 2 of 4 for Go:"));
        assert_eq!(
            session.answers,
            vec![AnswerRecord {
                tech: "Go".to_string(),
                question: bank[0].clone(),
                answer: "Channels".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_switch_takes_an_extra_round_trip() {
        let (mut session, generator, store, _dir) = fixture(&["Go", "Rust"]);
        next_step(&mut session, &generator, &store, 2, "").await;
        next_step(&mut session, &generator, &store, 2, "a1").await;
        let switch = next_step(&mut session, &generator, &store, 2, "a2").await;

        assert_eq!(switch, "Done with Go! Now moving to Rust.");
        assert_eq!(session.tech_index, 1);
        assert!(session.questions.is_none());
        assert_eq!(session.answers.len(), 2);

        // The message after the switch is not recorded as an answer.
        let first_rust = next_step(&mut session, &generator, &store, 2, "ready").await;
        assert!(first_rust.starts_with("Question 1 of 2 for Rust:"));
        assert_eq!(session.answers.len(), 2);
    }

    #[tokio::test]
    async fn test_last_answer_completes_and_persists() {
        let (mut session, generator, store, _dir) = fixture(&["Go"]);
        next_step(&mut session, &generator, &store, 1, "").await;
        let reply = next_step(&mut session, &generator, &store, 1, "done it").await;

        assert_eq!(reply, SCREENING_COMPLETE);
        assert!(session.ended);
        assert_eq!(session.completion_status, Some(CompletionStatus::Completed));
        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].answers.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_stack_completes_immediately() {
        let (mut session, generator, store, _dir) = fixture(&[]);
        let reply = next_step(&mut session, &generator, &store, 4, "").await;

        assert_eq!(reply, SCREENING_COMPLETE);
        assert_eq!(session.completion_status, Some(CompletionStatus::Completed));
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }
}
