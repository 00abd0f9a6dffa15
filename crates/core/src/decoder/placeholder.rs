//! Well-formed stand-ins for stage results that could not be decoded.

use sf_protocol::project_models::{Code, Design, Requirements, Tests, MAIN_FILE};
use std::collections::BTreeMap;

/// Package set assumed when a code reply names no dependencies.
pub const DEFAULT_DEPENDENCIES: [(&str, &str); 4] = [
    ("lucide-react", "^0.460.0"),
    ("framer-motion", "^11.11.11"),
    ("clsx", "^2.1.1"),
    ("tailwind-merge", "^2.5.4"),
];

pub fn default_dependencies() -> BTreeMap<String, String> {
    DEFAULT_DEPENDENCIES
        .iter()
        .map(|(name, version)| (name.to_string(), version.to_string()))
        .collect()
}

pub fn requirements() -> Requirements {
    Requirements {
        user_stories: Vec::new(),
        scope: "Failed to parse requirements".to_string(),
        assumptions: Vec::new(),
    }
}

pub fn design() -> Design {
    Design::default()
}

pub fn tests() -> Tests {
    Tests {
        test_cases: Vec::new(),
        results: "Error parsing test results".to_string(),
        bug_reports: String::new(),
    }
}

/// An error comment followed by a prefix of the raw reply, so the failure
/// can be diagnosed from the generated file itself.
pub fn code(raw: &str, diagnostic_chars: usize) -> Code {
    let excerpt: String = raw.chars().take(diagnostic_chars).collect();
    let body = format!(
        "// Error: Failed to extract valid React code from response.\n/*\n{}\n*/",
        excerpt.replace("*/", "* /")
    );
    Code {
        files: BTreeMap::from([(MAIN_FILE.to_string(), body)]),
        dependencies: BTreeMap::new(),
    }
}
