//! Pulling code out of a chat response.
//!
//! Responses usually wrap the code in a Markdown fence:
//!
//! ````text
//! ```python
//! def f(x: int) -> int:
//!     return x
//! ```
//! ````
//!
//! The opening fence is the first non-blank line when it is ```` ``` ```` or
//! ```` ``` ```` followed by a single word, and a later line starting with
//! ```` ``` ```` closes it. Anything else is returned as is.

/// Extract the first fenced code block from `raw`.
///
/// Without a complete fence (an opening line and a closing one) the whole
/// text is the candidate.
pub fn extract_code_block(raw: &str) -> String {
    let mut offset = 0;
    let mut lines = raw.split_inclusive('\n');
    let opening = loop {
        match lines.next() {
            Some(line) if line.trim().is_empty() => offset += line.len(),
            Some(line) => break line,
            None => return raw.to_string(),
        }
    };
    if !is_opening_fence(opening.trim()) {
        return raw.to_string();
    }

    let body_start = offset + opening.len();
    let body = &raw[body_start..];
    match closing_fence(body) {
        Some(end) => body[..end].to_string(),
        None => raw.to_string(),
    }
}

fn is_opening_fence(line: &str) -> bool {
    match line.strip_prefix("```") {
        Some(rest) => {
            let word = rest.trim();
            word.is_empty() || !word.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Byte offset of the line holding the closing fence.
fn closing_fence(body: &str) -> Option<usize> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
