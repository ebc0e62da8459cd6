//! The static sensitive-API signature list and the matcher.
//!
//! Signatures are matched by substring containment against the canonical
//! call string, so partial (method-only) and URI-qualified entries both
//! work. Loaded once at startup, read-only afterwards.

use std::path::Path;

use crate::api::ObservedApiCall;

/// List shipped with the crate, used when no external list is configured.
const DEFAULT_LIST: &str = include_str!("../resources/sensitive_api_list.txt");

#[derive(Debug, thiserror::Error)]
pub enum SensitiveListError {
    #[error("failed to read sensitive-API list from {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("sensitive-API list at {path} contains no signatures")]
    Empty { path: String },
}

/// Pure matcher: does the call's canonical string contain the signature?
///
/// Substring semantics are deliberate — a method-only pattern matches every
/// overload, a URI-qualified pattern matches only the named URI.
pub fn matches(call: &ObservedApiCall, signature: &str) -> bool {
    call.unique_string().contains(signature)
}

/// The loaded signature list.
#[derive(Debug, Clone)]
pub struct SensitiveApiList {
    signatures: Vec<String>,
}

impl SensitiveApiList {
    /// The embedded default list.
    pub fn embedded() -> Self {
        Self::from_str_list(DEFAULT_LIST)
    }

    /// Load from a newline-delimited file. Blank lines and `#` comments are
    /// skipped.
    pub fn from_file(path: &Path) -> Result<Self, SensitiveListError> {
        let text = std::fs::read_to_string(path).map_err(|source| SensitiveListError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let list = Self::from_str_list(&text);
        if list.is_empty() {
            return Err(SensitiveListError::Empty {
                path: path.display().to_string(),
            });
        }
        Ok(list)
    }

    fn from_str_list(text: &str) -> Self {
        let signatures = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(String::from)
            .collect();
        Self { signatures }
    }

    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Whether any configured signature matches this call.
    pub fn is_sensitive(&self, call: &ObservedApiCall) -> bool {
        self.signatures.iter().any(|sig| matches(call, sig))
    }
}
