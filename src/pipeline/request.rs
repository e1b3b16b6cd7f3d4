//! Request assembly: instruction + optional attachment + optional schema.
//!
//! All prompt wording lives in [`crate::prompts`]; this stage only decides
//! which pieces go into the single user turn and in what order.

use super::{encode, input::SelectedFile, schema};
use crate::config::AnalysisConfig;
use crate::prompts;
use crate::provider::{GenerateRequest, Part};

/// Build the request for one analysis.
///
/// ## Part Layout
///
/// 1. **Text**: the instruction, naming the file
/// 2. **Inline data** *(only when `contents` is given)*: the file bytes as base64
///
/// `contents` is `None` under [`crate::config::PromptPolicy::FilenameOnly`];
/// the caller never reads the file in that case.
pub fn build_request(
    file: &SelectedFile,
    contents: Option<&[u8]>,
    config: &AnalysisConfig,
) -> GenerateRequest {
    let instruction = match config.prompt_template {
        Some(ref template) => prompts::render_template(template, file.name()),
        None => prompts::instruction(config.policy, config.language, config.shape, file.name()),
    };

    let mut parts = vec![Part::Text(instruction)];
    if let Some(bytes) = contents {
        parts.push(encode::encode_attachment(bytes, file.attachment_mime_type()));
    }

    GenerateRequest {
        parts,
        response_schema: config
            .structured_output
            .then(|| schema::response_schema(config.shape)),
        temperature: config.temperature,
        max_output_tokens: config.max_output_tokens,
    }
}
