// Shared prompt fragments and the prompt dispatcher.
// Each feature that calls the model keeps its own templates in a prompts.rs
// alongside it; fragments used by more than one feature live here.

use crate::content::prompts::{description_prompt, quiz_prompt};
use crate::extraction::prompts::{grade_extraction_prompt, name_extraction_prompt};

/// Appended to prompts whose answer is shown to a user as-is.
pub const PLAIN_TEXT_ONLY: &str = "\
    Respond with the requested content only. \
    Do not add greetings, explanations or closing remarks.";

/// Appended to prompts whose answer is parsed as JSON.
pub const JSON_ONLY: &str = "\
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON. \
    Do NOT use markdown code fences.";

/// Numeric fields the model cannot read must still be present.
pub const MISSING_NUMBER_RULE: &str = "\
    If a numeric value is missing, illegible or not a number, write 0 in its place.";

/// Everything Campus asks the model to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptTask {
    Description { topic: String },
    Quiz { topic: String },
    NameExtraction,
    GradeExtraction,
}

/// Builds the instruction text for a task. Pure: the same task always yields
/// the same prompt.
pub fn build_prompt(task: &PromptTask) -> String {
    match task {
        PromptTask::Description { topic } => description_prompt(topic),
        PromptTask::Quiz { topic } => quiz_prompt(topic),
        PromptTask::NameExtraction => name_extraction_prompt(),
        PromptTask::GradeExtraction => grade_extraction_prompt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_is_deterministic() {
        let task = PromptTask::Quiz {
            topic: "Fractions".into(),
        };
        assert_eq!(build_prompt(&task), build_prompt(&task));
    }

    #[test]
    fn test_each_task_yields_distinct_prompt() {
        let prompts = [
            build_prompt(&PromptTask::Description { topic: "Volcanoes".into() }),
            build_prompt(&PromptTask::Quiz { topic: "Volcanoes".into() }),
            build_prompt(&PromptTask::NameExtraction),
            build_prompt(&PromptTask::GradeExtraction),
        ];
        for (i, a) in prompts.iter().enumerate() {
            assert!(!a.trim().is_empty());
            for b in prompts.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }
}
