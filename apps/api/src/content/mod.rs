// Session content generation: descriptions and quizzes for a topic.
// All model calls go through llm_client; nothing here parses the output.

pub mod generator;
pub mod handlers;
pub mod prompts;
