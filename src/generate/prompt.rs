//! Prompt text sent to the generation backend.

use super::GenerationRequest;

/// Instruction asking for bilingual documentation, or `""` when no
/// translation is wanted.
pub fn translation_directive(language: Option<&str>) -> String {
    match language.map(str::trim).filter(|l| !l.is_empty()) {
        Some(language) => format!(
            "Write each docstring and comment first in English, then add a newline and '---', \
             and add the translation to {}.",
            language
        ),
        None => String::new(),
    }
}

/// `"Python "` for a known language, `""` otherwise, so the label reads
/// naturally in front of a noun.
fn language_prefix(language: &str) -> String {
    if language.is_empty() {
        String::new()
    } else {
        format!("{} ", language)
    }
}

pub fn system_message(request: &GenerationRequest) -> String {
    format!(
        "You are a {}programming assistant who ONLY responds with blocks of code. \
         You never respond with text. Just code, starting with ``` and ending with ```.",
        language_prefix(&request.language)
    )
}

pub fn user_message(request: &GenerationRequest) -> String {
    format!(
        "Rewrite the following {}code by adding high-level explanatory comments, \
         PEP 257 docstrings, and PEP 484 style type annotations. Infer what each function \
         does, using the names and computations as hints. If there are existing comments \
         or types, augment them rather than replacing them. If the existing comments are \
         inconsistent with the code, correct them. Every function argument and return value \
         should be typed if possible. Do not change any other code. {} {}",
        language_prefix(&request.language),
        request.translation,
        request.fragment
    )
}
