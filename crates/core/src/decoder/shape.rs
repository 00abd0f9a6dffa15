//! Shape validation of recovered JSON.
//!
//! A recovered object is accepted only when every expected key is present.
//! Values are coerced leniently: a string where a list is expected becomes a
//! one-element list, nested structures where text is expected are rendered
//! back to JSON, and `null` becomes empty.

use crate::decoder::placeholder;
use serde_json::{Map, Value};
use sf_protocol::project_models::{Code, Design, Requirements, Tests, MAIN_FILE};
use std::collections::BTreeMap;
use thiserror::Error;

/// Why a recovered value was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationGap {
    #[error("recovered value is not a JSON object")]
    NotAnObject,
    #[error("missing expected key `{0}`")]
    MissingKey(&'static str),
    #[error("key `{0}` has an unusable shape")]
    WrongShape(&'static str),
}

/// A stage result that can be built from a recovered JSON value.
pub trait RecoveredShape: Sized {
    /// Keys that must all be present.
    const EXPECTED_KEYS: &'static [&'static str];

    fn from_recovered(value: &Value) -> Result<Self, ValidationGap>;
}

fn object(value: &Value) -> Result<&Map<String, Value>, ValidationGap> {
    value.as_object().ok_or(ValidationGap::NotAnObject)
}

fn require<'a>(map: &'a Map<String, Value>, key: &'static str) -> Result<&'a Value, ValidationGap> {
    map.get(key).ok_or(ValidationGap::MissingKey(key))
}

fn check_keys(map: &Map<String, Value>, keys: &[&'static str]) -> Result<(), ValidationGap> {
    keys.iter().try_for_each(|key| require(map, key).map(|_| ()))
}

/// Render any JSON value as text.
fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
    }
}

fn string_list(value: &Value, key: &'static str) -> Result<Vec<String>, ValidationGap> {
    match value {
        Value::Array(items) => Ok(items.iter().map(text).collect()),
        Value::String(s) if s.trim().is_empty() => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Null => Ok(Vec::new()),
        _ => Err(ValidationGap::WrongShape(key)),
    }
}

fn string_map(value: &Value, key: &'static str) -> Result<BTreeMap<String, String>, ValidationGap> {
    let map = value.as_object().ok_or(ValidationGap::WrongShape(key))?;
    Ok(map.iter().map(|(k, v)| (k.clone(), text(v))).collect())
}

impl RecoveredShape for Requirements {
    const EXPECTED_KEYS: &'static [&'static str] = &["userStories", "scope", "assumptions"];

    fn from_recovered(value: &Value) -> Result<Self, ValidationGap> {
        let map = object(value)?;
        check_keys(map, Self::EXPECTED_KEYS)?;
        Ok(Requirements {
            user_stories: string_list(require(map, "userStories")?, "userStories")?,
            scope: text(require(map, "scope")?),
            assumptions: string_list(require(map, "assumptions")?, "assumptions")?,
        })
    }
}

impl RecoveredShape for Design {
    const EXPECTED_KEYS: &'static [&'static str] = &["architecture", "wireframes", "apiContracts"];

    fn from_recovered(value: &Value) -> Result<Self, ValidationGap> {
        let map = object(value)?;
        check_keys(map, Self::EXPECTED_KEYS)?;
        Ok(Design {
            architecture: text(require(map, "architecture")?),
            wireframes: text(require(map, "wireframes")?),
            api_contracts: text(require(map, "apiContracts")?),
        })
    }
}

impl RecoveredShape for Tests {
    const EXPECTED_KEYS: &'static [&'static str] = &["testCases", "results", "bugReports"];

    fn from_recovered(value: &Value) -> Result<Self, ValidationGap> {
        let map = object(value)?;
        check_keys(map, Self::EXPECTED_KEYS)?;
        Ok(Tests {
            test_cases: string_list(require(map, "testCases")?, "testCases")?,
            results: text(require(map, "results")?),
            bug_reports: text(require(map, "bugReports")?),
        })
    }
}

impl RecoveredShape for Code {
    const EXPECTED_KEYS: &'static [&'static str] = &["files"];

    /// Accepts `{"files": {...}, "dependencies": {...}}` whose files include
    /// the main file. A missing dependency map becomes the default set.
    fn from_recovered(value: &Value) -> Result<Self, ValidationGap> {
        let map = object(value)?;
        let files = string_map(require(map, "files")?, "files")?;
        if !files.contains_key(MAIN_FILE) {
            return Err(ValidationGap::MissingKey(MAIN_FILE));
        }
        let dependencies = match map.get("dependencies") {
            Some(Value::Null) | None => placeholder::default_dependencies(),
            Some(deps) => string_map(deps, "dependencies")?,
        };
        Ok(Code {
            files,
            dependencies,
        })
    }
}
