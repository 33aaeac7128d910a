//! Patch synthesis stage: one oracle call producing a full candidate
//! replacement source, plus the extraction that digs the code out of the raw
//! response.
//!
//! Extraction never fails. A response with no usable fence degrades to the
//! raw text; whether the result is any good is decided by the next
//! execution, not here.

use regex::Regex;
use tracing::{info, warn};

use super::prompts;
use crate::language::Language;
use crate::oracle::{Oracle, OracleError};

pub async fn synthesize(
    oracle: &dyn Oracle,
    source: &str,
    error_log: &str,
    diagnosis: &str,
    language: &Language,
) -> Result<String, OracleError> {
    info!("requesting candidate patch ({})", language.name);

    let instructions = prompts::patch_system(language);
    let message = prompts::patch_message(language, source, error_log, diagnosis);
    let response = oracle.invoke(&instructions, &message).await?;

    let candidate = extract_code_block(&response, language.fence);
    info!("candidate patch extracted ({} chars)", candidate.len());
    Ok(candidate)
}

/// Pull the replacement source out of a raw oracle response.
///
/// Priority order: the first fenced block tagged with the expected language
/// marker; else the first fenced block with any (or no) tag; else the whole
/// response. The result is always trimmed.
pub fn extract_code_block(text: &str, fence: &str) -> String {
    // The newline after the tag is required so that e.g. "sh" cannot match
    // the front of a ```shell block.
    let tagged = format!(r"(?s)```{}[ \t]*\r?\n(.*?)```", regex::escape(fence));
    if let Ok(re) = Regex::new(&tagged) {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                return m.as_str().trim().to_string();
            }
        }
    }

    if let Ok(re) = Regex::new(r"(?s)```(?:\w+)?[ \t]*\r?\n?(.*?)```") {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                warn!("no ```{fence}``` block found, using first fenced block");
                return m.as_str().trim().to_string();
            }
        }
    }

    warn!("no fenced block found, using raw response");
    text.trim().to_string()
}
