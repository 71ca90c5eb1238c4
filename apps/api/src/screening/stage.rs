use serde::Serialize;

/// Closed set of conversation stages. Transitions live in `conversation.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greet,
    AskName,
    AskEmail,
    AskPhone,
    AskExperience,
    AskPosition,
    AskLocation,
    AskTechStack,
    ConfirmTechStack,
    AskCorrectedTechStack,
    TechQuestions,
    Ended,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Greet => "greet",
            Stage::AskName => "ask_name",
            Stage::AskEmail => "ask_email",
            Stage::AskPhone => "ask_phone",
            Stage::AskExperience => "ask_experience",
            Stage::AskPosition => "ask_position",
            Stage::AskLocation => "ask_location",
            Stage::AskTechStack => "ask_tech_stack",
            Stage::ConfirmTechStack => "confirm_tech_stack",
            Stage::AskCorrectedTechStack => "ask_corrected_tech_stack",
            Stage::TechQuestions => "tech_questions",
            Stage::Ended => "ended",
        }
    }
}
