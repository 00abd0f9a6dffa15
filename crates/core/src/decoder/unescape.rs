//! Reversal of JSON string escaping in extracted source code.

/// Whether code still carries string escapes instead of real line breaks.
///
/// Code lifted out of a JSON string (or double-encoded by the model) shows
/// literal `\n` sequences and no actual newline.
pub fn looks_escaped(code: &str) -> bool {
    code.contains("\\n") && !code.contains('\n')
}

/// Undo one level of JSON string escaping.
///
/// Decodes the text as the body of a JSON string literal. When that fails
/// (for example because of a stray unescaped quote) falls back to replacing
/// `\n`, then `\"`, then `\\`, in that order.
pub fn unescape_code(code: &str) -> String {
    if let Ok(decoded) = serde_json::from_str::<String>(&format!("\"{code}\"")) {
        return decoded;
    }
    code.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .replace("\\\\", "\\")
}

/// Unescape only when the code looks escaped.
pub fn normalize_code(code: String) -> String {
    if looks_escaped(&code) {
        unescape_code(&code)
    } else {
        code
    }
}
