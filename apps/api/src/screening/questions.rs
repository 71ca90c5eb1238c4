//! Question sourcing — parses generated numbered lists and falls back to a fixed bank.
//!
//! A `QuestionSet` is homogeneous: either every question came from the model or every
//! question came from the bank. A short parse is thrown away, never topped up.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::llm_client::prompts::QUESTION_PROMPT_TEMPLATE;
use crate::llm_client::{Generation, GenerationClient, StageContext};
use crate::screening::models::{ChatTurn, Difficulty};
use crate::screening::stage::Stage;

static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s*(.+)$").expect("numbered line pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    pub questions: Vec<String>,
    pub source: QuestionSource,
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.questions.get(index).map(String::as_str)
    }
}

/// Requests `count` questions for one technology, falling back to the bank when the
/// model is unavailable or yields fewer than `count` usable lines.
pub async fn question_set_for(
    client: &GenerationClient,
    tech: &str,
    difficulty: Difficulty,
    count: usize,
    history: &[ChatTurn],
) -> QuestionSet {
    let prompt = QUESTION_PROMPT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{tech}", tech)
        .replace("{difficulty}", difficulty.as_str());
    let context = StageContext {
        stage: Stage::TechQuestions.as_str().to_string(),
        technology: tech.to_string(),
        difficulty: difficulty.as_str().to_string(),
        question_number: 0,
    };

    let parsed = match client.generate(&prompt, history, &context).await {
        Generation::Text(text) => parse_questions(&text, count),
        Generation::Unavailable => None,
    };

    match parsed {
        Some(questions) => QuestionSet {
            questions,
            source: QuestionSource::Generated,
        },
        None => {
            info!("Using fallback questions for {tech} ({difficulty})");
            QuestionSet {
                questions: fallback_questions(tech, difficulty, count),
                source: QuestionSource::Fallback,
            }
        }
    }
}

/// Extracts questions from model output.
///
/// Each non-blank line contributes if it is numbered (`1. ...` / `1) ...`) or ends in
/// `?`. Returns the first `count` when at least that many were found, else `None`.
pub fn parse_questions(text: &str, count: usize) -> Option<Vec<String>> {
    let mut questions = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = NUMBERED_LINE_RE.captures(line) {
            questions.push(caps[1].trim().to_string());
        } else if line.ends_with('?') {
            questions.push(line.to_string());
        }
    }

    if count > 0 && questions.len() >= count {
        questions.truncate(count);
        Some(questions)
    } else {
        None
    }
}

/// The bank's four templates for a tier, repeated in order until `count` are filled.
pub fn fallback_questions(tech: &str, difficulty: Difficulty, count: usize) -> Vec<String> {
    let bank = match difficulty {
        Difficulty::Beginner => [
            format!("Explain a basic concept in {tech}."),
            format!("Describe a small project you built with {tech}."),
            format!("What challenges did you face while learning {tech}?"),
            format!("How does {tech} handle a common task?"),
        ],
        Difficulty::Intermediate => [
            format!("Describe a complex {tech} project."),
            format!("What best practices do you follow with {tech}?"),
            format!("How do you debug problems in {tech}?"),
            format!("What advanced {tech} features have you used?"),
        ],
        Difficulty::Advanced => [
            format!("How do you optimize {tech} for performance?"),
            format!("Describe your experience scaling apps with {tech}."),
            format!("What design patterns do you use in {tech}?"),
            format!("How do you stay updated with {tech} changes?"),
        ],
    };

    bank.iter().cycle().take(count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmError, TextModel};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct CannedModel(&'static str);

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate_content(&self, _prompt: &str) -> Result<Option<String>, LlmError> {
            Ok(Some(self.0.to_string()))
        }
    }

    fn canned(text: &'static str) -> GenerationClient {
        let model: Arc<dyn TextModel> = Arc::new(CannedModel(text));
        GenerationClient::new(Some(model), 3, Duration::from_millis(1))
    }

    #[test]
    fn test_parse_numbered_list() {
        let text = "Here you go:\n1. What is a goroutine?\n2) Explain channels.\n3. What is defer?\n4. How do interfaces work?";
        let parsed = parse_questions(text, 4).unwrap();
        assert_eq!(
            parsed,
            vec![
                "What is a goroutine?",
                "Explain channels.",
                "What is defer?",
                "How do interfaces work?"
            ]
        );
    }

    #[test]
    fn test_parse_question_mark_lines() {
        let text = "What is ownership?\nWhy borrow?\nNot a question\nWhat is a trait?";
        assert_eq!(
            parse_questions(text, 3).unwrap(),
            vec!["What is ownership?", "Why borrow?", "What is a trait?"]
        );
    }

    #[test]
    fn test_parse_keeps_first_count() {
        let text = "1. a\n2. b\n3. c\n4. d\n5. e";
        assert_eq!(parse_questions(text, 4).unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_parse_too_few_is_none() {
        assert!(parse_questions("1. a\n2. b", 4).is_none());
        assert!(parse_questions("", 4).is_none());
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(
            fallback_questions("Go", Difficulty::Intermediate, 4),
            fallback_questions("Go", Difficulty::Intermediate, 4)
        );
        assert_eq!(
            fallback_questions("Go", Difficulty::Beginner, 1),
            vec!["Explain a basic concept in Go."]
        );
    }

    #[test]
    fn test_fallback_repeats_templates_to_fill() {
        let questions = fallback_questions("Rust", Difficulty::Advanced, 6);
        assert_eq!(questions.len(), 6);
        assert_eq!(questions[4], questions[0]);
        assert_eq!(questions[5], questions[1]);
    }

    #[tokio::test]
    async fn test_short_generation_falls_back_entirely() {
        let client = canned("1. Generated one?\n2. Generated two?");
        let set = question_set_for(&client, "Go", Difficulty::Intermediate, 4, &[]).await;
        assert_eq!(set.source, QuestionSource::Fallback);
        assert_eq!(set.len(), 4);
        assert!(set.questions.iter().all(|q| !q.starts_with("Generated")));
        assert_eq!(set.questions, fallback_questions("Go", Difficulty::Intermediate, 4));
    }

    #[tokio::test]
    async fn test_full_generation_is_used() {
        let client = canned("1. A?\n2. B?\n3. C?\n4. D?");
        let set = question_set_for(&client, "Go", Difficulty::Beginner, 4, &[]).await;
        assert_eq!(set.source, QuestionSource::Generated);
        assert_eq!(set.get(3), Some("D?"));
    }

    #[tokio::test]
    async fn test_unavailable_model_uses_bank() {
        let client = GenerationClient::new(None, 3, Duration::from_millis(1));
        let set = question_set_for(&client, "SQL", Difficulty::Advanced, 4, &[]).await;
        assert_eq!(set.source, QuestionSource::Fallback);
        assert_eq!(set.get(0), Some("How do you optimize SQL for performance?"));
    }
}
