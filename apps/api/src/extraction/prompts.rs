// Prompt templates and output schema for extracting records from images.

use serde_json::{json, Value};

use crate::llm_client::prompts::{JSON_ONLY, MISSING_NUMBER_RULE};

const NAME_EXTRACTION_PROMPT: &str = "\
The attached image is a class list, attendance sheet or similar document.
List every student name that appears in it.

Output rules:
1. One name per line, exactly as written in the image.
2. Output ONLY the names: no numbering, no bullets, no headings, no commentary.
3. If the image contains no names, output nothing.";

const GRADE_EXTRACTION_PROMPT: &str = "\
The attached image is a grade sheet.
For every student in it, extract the student's name and their three grades.

Return a JSON array where each element has exactly these fields:
  \"name\": the student's full name as written (string)
  \"note1\": first grade (number)
  \"note2\": second grade (number)
  \"note3\": third grade (number)

Output rules:
1. Output ONLY the array of grade records, nothing else.
2. Use a dot as the decimal separator.
3. If the image contains no students, output [].";

pub fn name_extraction_prompt() -> String {
    NAME_EXTRACTION_PROMPT.to_string()
}

pub fn grade_extraction_prompt() -> String {
    format!("{GRADE_EXTRACTION_PROMPT}\n\n{MISSING_NUMBER_RULE}\n{JSON_ONLY}")
}

/// Structured-output schema sent with grade extraction. The gateway passes it
/// through untouched; the reply is still parsed defensively.
pub fn grade_record_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": { "type": "STRING" },
                "note1": { "type": "NUMBER" },
                "note2": { "type": "NUMBER" },
                "note3": { "type": "NUMBER" }
            },
            "required": ["name", "note1", "note2", "note3"],
            "propertyOrdering": ["name", "note1", "note2", "note3"]
        }
    })
}
