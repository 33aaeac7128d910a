//! Diagnosis stage: one oracle call turning (source, failure output) into a
//! natural-language root-cause analysis. No side effects beyond the call; an
//! oracle failure propagates and ends the session.

use tracing::info;

use super::prompts;
use crate::language::Language;
use crate::oracle::{Oracle, OracleError};

pub async fn diagnose(
    oracle: &dyn Oracle,
    source: &str,
    error_log: &str,
    language: &Language,
) -> Result<String, OracleError> {
    info!("requesting root-cause diagnosis ({})", language.name);

    let instructions = prompts::diagnosis_system(language);
    let message = prompts::diagnosis_message(language, source, error_log);
    let analysis = oracle.invoke(&instructions, &message).await?;

    info!("diagnosis received ({} chars)", analysis.len());
    Ok(analysis)
}
