// Prompt templates for session content generation.

use crate::llm_client::prompts::PLAIN_TEXT_ONLY;

/// Soft cap on description length. Style guidance only; nothing enforces it.
pub const DESCRIPTION_WORD_LIMIT: u32 = 120;

/// Session description template. Replace `{topic}` and `{word_limit}` before sending.
const DESCRIPTION_TEMPLATE: &str = r#"Write a short description of a training session on the topic "{topic}".

Requirements:
1. Keep the description under {word_limit} words.
2. Follow it with exactly three learning objectives, as a numbered list (1., 2., 3.).
3. Write for the students attending the session, in a clear and encouraging tone."#;

/// Quiz template. Replace `{topic}` before sending.
const QUIZ_TEMPLATE: &str = r#"Write a quiz on the topic "{topic}".

Requirements:
1. Exactly three multiple-choice questions, numbered 1 to 3.
2. Each question has four options labelled A), B), C) and D).
3. After the options of each question, give the correct answer on its own line as "Answer: <letter>".
4. Only one option per question is correct."#;

pub fn description_prompt(topic: &str) -> String {
    let body = DESCRIPTION_TEMPLATE
        .replace("{topic}", topic.trim())
        .replace("{word_limit}", &DESCRIPTION_WORD_LIMIT.to_string());
    format!("{body}\n\n{PLAIN_TEXT_ONLY}")
}

pub fn quiz_prompt(topic: &str) -> String {
    let body = QUIZ_TEMPLATE.replace("{topic}", topic.trim());
    format!("{body}\n\n{PLAIN_TEXT_ONLY}")
}
