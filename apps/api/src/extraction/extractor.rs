//! Extractor — runs one model call per image and parses the reply.

use tracing::{debug, info};

use crate::errors::AppError;
use crate::extraction::parser::{parse_grade_records, parse_names, ExtractedGradeRecord};
use crate::extraction::prompts::grade_record_schema;
use crate::llm_client::prompts::{build_prompt, PromptTask};
use crate::llm_client::{GenerationRequest, InlineAttachment, TextGenerator};

/// Reads student names from an image. Gateway failures are surfaced; an
/// unreadable reply is not, and simply yields no names.
pub async fn extract_names(
    llm: &dyn TextGenerator,
    image: InlineAttachment,
) -> Result<Vec<String>, AppError> {
    debug!(
        "Extracting names from {} image ({} bytes)",
        image.mime_type,
        image.decoded_len()
    );
    let request =
        GenerationRequest::text(build_prompt(&PromptTask::NameExtraction)).with_attachment(image);

    let raw = llm.generate(&request).await?;
    let names = parse_names(&raw);

    info!("Extracted {} names", names.len());
    Ok(names)
}

/// Reads grade records from an image, constraining the reply to the grade
/// record schema. A reply that cannot be parsed is a `MalformedResponse`.
pub async fn extract_grades(
    llm: &dyn TextGenerator,
    image: InlineAttachment,
) -> Result<Vec<ExtractedGradeRecord>, AppError> {
    debug!(
        "Extracting grades from {} image ({} bytes)",
        image.mime_type,
        image.decoded_len()
    );
    let request = GenerationRequest::text(build_prompt(&PromptTask::GradeExtraction))
        .with_attachment(image)
        .with_schema(grade_record_schema());

    let raw = llm.generate(&request).await?;
    let records = parse_grade_records(&raw)?;

    info!("Extracted {} grade records", records.len());
    Ok(records)
}
