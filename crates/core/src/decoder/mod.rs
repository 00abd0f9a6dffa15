//! Response decoder.
//!
//! Models rarely return exactly what was asked for: JSON arrives wrapped in
//! prose or Markdown fences, code arrives as an escaped JSON string, replies
//! get cut off. The decoder tries a fixed sequence of recovery strategies
//! against the raw reply and falls back to a well-formed placeholder, so a
//! decode never fails.
//!
//! ## Modules
//!
//! - [`strategies`]: the individual recovery strategies
//! - [`shape`]: validation of recovered JSON against the expected result
//! - [`unescape`]: reversal of JSON string escaping in extracted code
//! - [`placeholder`]: fallback results and the default dependency set

pub mod placeholder;
pub mod shape;
pub mod strategies;
pub mod unescape;

pub use shape::{RecoveredShape, ValidationGap};
pub use strategies::Recovery;

use sf_protocol::project_models::{Code, Design, Requirements, Tests, MAIN_FILE};
use std::collections::BTreeMap;

/// A decoded stage result and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,

    /// `None` when every strategy failed and `value` is a placeholder.
    pub recovery: Option<Recovery>,
}

impl<T> Decoded<T> {
    fn recovered(value: T, recovery: Recovery) -> Self {
        Self {
            value,
            recovery: Some(recovery),
        }
    }

    fn placeholder(value: T) -> Self {
        Self {
            value,
            recovery: None,
        }
    }

    /// True when the value is a placeholder.
    pub fn is_degraded(&self) -> bool {
        self.recovery.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        Decoded {
            value: f(self.value),
            recovery: self.recovery,
        }
    }
}

/// Try the JSON strategies in order; return the first value that validates.
pub fn decode_json<T: RecoveredShape>(raw: &str) -> Option<Decoded<T>> {
    for recovery in Recovery::JSON {
        let Some(value) = recovery.recover_json(raw) else {
            continue;
        };
        match T::from_recovered(&value) {
            Ok(shape) => return Some(Decoded::recovered(shape, recovery)),
            Err(gap) => tracing::debug!(strategy = %recovery, %gap, "recovered JSON rejected"),
        }
    }
    None
}

pub fn decode_requirements(raw: &str) -> Decoded<Requirements> {
    decode_json(raw).unwrap_or_else(|| {
        tracing::warn!("requirements reply could not be decoded, using placeholder");
        Decoded::placeholder(placeholder::requirements())
    })
}

pub fn decode_design(raw: &str) -> Decoded<Design> {
    decode_json(raw).unwrap_or_else(|| {
        tracing::warn!("design reply could not be decoded, using placeholder");
        Decoded::placeholder(placeholder::design())
    })
}

pub fn decode_tests(raw: &str) -> Decoded<Tests> {
    decode_json(raw).unwrap_or_else(|| {
        tracing::warn!("testing reply could not be decoded, using placeholder");
        Decoded::placeholder(placeholder::tests())
    })
}

/// Decode a Development or Modification reply.
///
/// A JSON object with a `files` map is taken as-is. Otherwise the source
/// text is extracted, unescaped when needed, and wrapped with the default
/// dependency set. `diagnostic_chars` bounds the raw excerpt kept in the
/// placeholder.
pub fn decode_code(raw: &str, diagnostic_chars: usize) -> Decoded<Code> {
    if let Some(decoded) = files_object(raw) {
        return decoded;
    }

    for recovery in Recovery::SOURCE {
        if let Some(source) = recovery.recover_source(raw) {
            let source = unescape::normalize_code(source);
            return Decoded::recovered(wrap_source(source), recovery);
        }
    }

    tracing::warn!(chars = raw.len(), "code reply could not be decoded, using placeholder");
    Decoded::placeholder(placeholder::code(raw, diagnostic_chars))
}

fn files_object(raw: &str) -> Option<Decoded<Code>> {
    let decoded = decode_json::<Code>(raw)?;
    Some(Decoded::recovered(decoded.value, Recovery::FilesObject).map(|mut code| {
        code.files = code
            .files
            .into_iter()
            .map(|(path, source)| (path, unescape::normalize_code(source)))
            .collect();
        code
    }))
}

fn wrap_source(source: String) -> Code {
    Code {
        files: BTreeMap::from([(MAIN_FILE.to_string(), source)]),
        dependencies: placeholder::default_dependencies(),
    }
}
