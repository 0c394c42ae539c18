//! Word helpers for the suggestion pipeline.
//!
//! The prediction service completes the word currently being typed. These
//! helpers extract that word from the prompt and adjust the case of returned
//! continuations so they blend in with what the user already typed.

/// The word currently being typed: the suffix of `prompt` after the last
/// whitespace character.
///
/// Empty if the prompt is empty or ends in whitespace. A prompt that starts
/// with whitespace never yields an empty leading segment; the rule is purely
/// "suffix after the last whitespace".
pub fn current_word(prompt: &str) -> &str {
    prompt
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("")
}

/// Adjust a continuation's case to match the word it will replace.
///
/// If the word being replaced starts with an uppercase letter, only the first
/// character of the continuation is uppercased and the rest is left alone.
/// Otherwise the whole continuation is lowercased.
pub fn match_case(continuation: &str, word_to_replace: &str) -> String {
    let starts_upper = word_to_replace
        .chars()
        .next()
        .is_some_and(char::is_uppercase);

    if starts_upper {
        let mut chars = continuation.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else {
        continuation.to_lowercase()
    }
}
