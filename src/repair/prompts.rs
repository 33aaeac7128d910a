//! System instructions for the repair stages, parameterized by the target
//! language so a `.go` file gets a Go engineer and Go fences end to end.

use crate::language::Language;

pub fn diagnosis_system(language: &Language) -> String {
    format!(
        "You are a senior {name} engineer specializing in bug analysis and root-cause \
localization.\n\
Read the {name} code and the runtime error log you are given, then produce a structured \
analysis:\n\
\n\
1. Error type (e.g. a Go panic, a Java exception, a Python ZeroDivisionError)\n\
2. Root cause: one sentence on why the error occurs\n\
3. Location: file name and line number, where the traceback or stack gives one\n\
4. Fix direction: describe how to repair it in plain language - do not write code\n",
        name = language.name
    )
}

pub fn diagnosis_message(language: &Language, source: &str, error_log: &str) -> String {
    format!(
        "[{name} source]\n```{fence}\n{source}\n```\n\n\
[runtime error log]\n```\n{error_log}\n```\n\n\
Produce the root-cause analysis as instructed.",
        name = language.name,
        fence = language.fence,
    )
}

pub fn patch_system(language: &Language) -> String {
    format!(
        "You are a senior {name} engineer.\n\
Fix the bug in the code you are given, using the error log and the root-cause analysis.\n\
\n\
Output rules (strict):\n\
- Output the complete fixed {name} code, without omitting a single line\n\
- The code must be inside a ```{fence} ... ``` block\n\
- No prose outside the code block\n",
        name = language.name,
        fence = language.fence,
    )
}

pub fn patch_message(
    language: &Language,
    source: &str,
    error_log: &str,
    diagnosis: &str,
) -> String {
    format!(
        "[buggy {name} code]\n```{fence}\n{source}\n```\n\n\
[error log]\n```\n{error_log}\n```\n\n\
[root-cause analysis]\n{diagnosis}\n\n\
Output the complete fixed {name} code, inside a ```{fence} ... ``` block.",
        name = language.name,
        fence = language.fence,
    )
}
