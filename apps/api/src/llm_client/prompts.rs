// Prompt fragments shared by every generation request.

use super::StageContext;

/// Preamble template. Replace: {stage}, {current_tech}, {difficulty}, {question_num}
pub const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are TalentScout's Hiring Assistant, a professional AI for tech screening.
Follow the user's stage strictly and ask one question at a time.
Stage: {stage}
Current tech: {current_tech}
Difficulty: {difficulty}
Question number: {question_num}";

/// Question request template. Replace: {count}, {tech}, {difficulty}
pub const QUESTION_PROMPT_TEMPLATE: &str = "Generate exactly {count} practical technical \
interview questions for {tech} at {difficulty} level. Use numbered list.";

pub fn render_system_prompt(context: &StageContext) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{stage}", &context.stage)
        .replace("{current_tech}", &context.technology)
        .replace("{difficulty}", &context.difficulty)
        .replace("{question_num}", &context.question_number.to_string())
}
