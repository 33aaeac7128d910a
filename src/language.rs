//! Language inference from file extensions
//!
//! The display name feeds the oracle prompts ("You are a senior Go
//! engineer..."); the fence tag drives code-block extraction (```go).

use std::path::Path;

/// A source language as seen by the prompts and the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Display name, e.g. "Python", "Go"
    pub name: &'static str,
    /// Markdown fence tag, e.g. "python", "go"
    pub fence: &'static str,
}

const EXTENSION_TABLE: &[(&str, Language)] = &[
    ("py", Language { name: "Python", fence: "python" }),
    ("go", Language { name: "Go", fence: "go" }),
    ("java", Language { name: "Java", fence: "java" }),
    ("kt", Language { name: "Kotlin", fence: "kotlin" }),
    ("js", Language { name: "JavaScript", fence: "javascript" }),
    ("ts", Language { name: "TypeScript", fence: "typescript" }),
    ("tsx", Language { name: "TypeScript React", fence: "tsx" }),
    ("jsx", Language { name: "JavaScript React", fence: "jsx" }),
    ("rs", Language { name: "Rust", fence: "rust" }),
    ("cpp", Language { name: "C++", fence: "cpp" }),
    ("cc", Language { name: "C++", fence: "cpp" }),
    ("cxx", Language { name: "C++", fence: "cpp" }),
    ("c", Language { name: "C", fence: "c" }),
    ("h", Language { name: "C/C++ Header", fence: "c" }),
    ("rb", Language { name: "Ruby", fence: "ruby" }),
    ("php", Language { name: "PHP", fence: "php" }),
    ("swift", Language { name: "Swift", fence: "swift" }),
    ("scala", Language { name: "Scala", fence: "scala" }),
    ("sh", Language { name: "Shell", fence: "sh" }),
    ("bash", Language { name: "Shell", fence: "bash" }),
];

/// Default when the extension is unknown or absent.
pub const DEFAULT_LANGUAGE: Language = Language {
    name: "Python",
    fence: "python",
};

/// Infer the language of a file from its extension. Unknown extensions fall
/// back to Python, matching the interpreter default.
pub fn from_path(path: &Path) -> Language {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_LANGUAGE,
    };
    EXTENSION_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or(DEFAULT_LANGUAGE)
}

/// Whether a file extension maps to a language we know how to label.
pub fn is_known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            EXTENSION_TABLE.iter().any(|(e, _)| *e == ext)
        })
        .unwrap_or(false)
}
