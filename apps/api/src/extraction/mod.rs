// Record extraction from uploaded images: student names and grade sheets.
// Flow: image → attachment → prompt → llm_client → parser → typed records.

pub mod extractor;
pub mod handlers;
pub mod parser;
pub mod prompts;
