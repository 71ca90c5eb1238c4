//! Conversation state machine — one user message in, one assistant reply out.
//!
//! Collection stages each map to one validator; `tech_questions` delegates to the
//! tracker. The only backward edge is the tech-stack correction loop.

use std::sync::Arc;

use tracing::info;

use crate::llm_client::GenerationClient;
use crate::screening::finalizer::finalize;
use crate::screening::models::{ChatTurn, CompletionStatus, Role};
use crate::screening::session::Session;
use crate::screening::stage::Stage;
use crate::screening::store::RecordStore;
use crate::screening::tracker;
use crate::screening::validators::{
    contains_exit_keyword, first_name, is_valid_email, is_valid_phone, parse_confirmation,
    parse_experience, parse_tech_stack, Confirmation,
};

pub const GREETING: &str = "Hello! I'm your TalentScout Hiring Assistant. What's your full name?";
pub const EXIT_REPLY: &str = "Thank you for your time. You may continue later anytime.";
pub const ALREADY_ENDED: &str =
    "This screening has ended. Thank you for your time! Start a new chat to begin again.";
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that. Let's continue.";

/// Runs conversations. Holds only shared collaborators; all per-candidate state is in
/// the `Session` passed to each call.
#[derive(Clone)]
pub struct Screener {
    generator: GenerationClient,
    store: Arc<RecordStore>,
    questions_per_tech: usize,
    history_limit: usize,
}

impl Screener {
    pub fn new(
        generator: GenerationClient,
        store: Arc<RecordStore>,
        questions_per_tech: usize,
        history_limit: usize,
    ) -> Self {
        Self {
            generator,
            store,
            questions_per_tech: questions_per_tech.max(1),
            history_limit,
        }
    }

    pub fn questions_per_tech(&self) -> usize {
        self.questions_per_tech
    }

    /// A fresh session, already greeted and waiting for the candidate's name.
    pub fn start_session(&self) -> (Session, String) {
        let mut session = Session::new(self.history_limit);
        let greeting = self.greet(&mut session);
        (session, greeting)
    }

    /// `greet` → `ask_name`, without user input.
    fn greet(&self, session: &mut Session) -> String {
        session.stage = Stage::AskName;
        session.push_turn(ChatTurn::new(Role::Assistant, GREETING));
        GREETING.to_string()
    }

    /// Processes one user message and returns the reply.
    pub async fn handle_message(&self, session: &mut Session, message: &str) -> String {
        let text = message.trim();

        if session.ended {
            return ALREADY_ENDED.to_string();
        }
        session.touch();
        if session.stage == Stage::Greet {
            return self.greet(session);
        }
        if text.is_empty() {
            return NOT_UNDERSTOOD.to_string();
        }

        session.push_turn(ChatTurn::new(Role::User, text));

        let reply = if contains_exit_keyword(text) {
            info!("Session {} exited at stage {}", session.id, session.stage.as_str());
            finalize(session, CompletionStatus::Partial, &self.store).await;
            EXIT_REPLY.to_string()
        } else {
            self.dispatch(session, text).await
        };

        session.push_turn(ChatTurn::new(Role::Assistant, reply.clone()));
        reply
    }

    async fn dispatch(&self, session: &mut Session, text: &str) -> String {
        match session.stage {
            Stage::Greet => self.greet(session),
            Stage::AskName => {
                session.profile.name = Some(text.to_string());
                session.stage = Stage::AskEmail;
                format!(
                    "Nice to meet you, {}! Please provide your email.",
                    first_name(text)
                )
            }
            Stage::AskEmail => {
                if !is_valid_email(text) {
                    return "Please provide a valid email.".to_string();
                }
                session.profile.email = Some(text.to_string());
                session.stage = Stage::AskPhone;
                "Please provide your phone number.".to_string()
            }
            Stage::AskPhone => {
                if !is_valid_phone(text) {
                    return "Please share your phone number (min 10 digits).".to_string();
                }
                session.profile.phone = Some(text.to_string());
                session.stage = Stage::AskExperience;
                "How many years of experience do you have? (e.g., 2.5)".to_string()
            }
            Stage::AskExperience => match parse_experience(text) {
                Some(years) => {
                    session.profile.experience = Some(years);
                    session.stage = Stage::AskPosition;
                    format!("{years:?} years noted. What position are you applying for?")
                }
                None => "Please share your professional experience in years.".to_string(),
            },
            Stage::AskPosition => {
                session.profile.position = Some(text.to_string());
                session.stage = Stage::AskLocation;
                "What's your current location?".to_string()
            }
            Stage::AskLocation => {
                session.profile.location = Some(text.to_string());
                session.stage = Stage::AskTechStack;
                "List your tech stack separated by commas.".to_string()
            }
            Stage::AskTechStack => self.collect_tech_stack(session, text, "Here's what I got"),
            Stage::AskCorrectedTechStack => {
                self.collect_tech_stack(session, text, "Here's what I got now")
            }
            Stage::ConfirmTechStack => match parse_confirmation(text) {
                Confirmation::Yes => {
                    session.stage = Stage::TechQuestions;
                    session.tech_index = 0;
                    session.questions = None;
                    session.question_index = 0;
                    info!(
                        "Session {} starting technical questions for {} technologies",
                        session.id,
                        session.profile.tech_stack.len()
                    );
                    self.next_tech_step(session, "").await
                }
                Confirmation::No => {
                    session.stage = Stage::AskCorrectedTechStack;
                    "Okay, please provide the corrected tech stack.".to_string()
                }
                Confirmation::Unclear => "Please answer Yes or No.".to_string(),
            },
            Stage::TechQuestions => self.next_tech_step(session, text).await,
            Stage::Ended => ALREADY_ENDED.to_string(),
        }
    }

    fn collect_tech_stack(&self, session: &mut Session, text: &str, lead: &str) -> String {
        let Some(techs) = parse_tech_stack(text) else {
            return "Please list at least one tech.".to_string();
        };
        let listing = techs.join("\n• ");
        session.profile.tech_stack = techs;
        session.stage = Stage::ConfirmTechStack;
        format!("{lead}:\n• {listing}\n\nIs this correct? (Yes/No)")
    }

    async fn next_tech_step(&self, session: &mut Session, text: &str) -> String {
        tracker::next_step(
            session,
            &self.generator,
            &self.store,
            self.questions_per_tech,
            text,
        )
        .await
    }
}
