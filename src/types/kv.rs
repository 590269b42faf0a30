// ABOUTME: Parsing for repeated KEY=VALUE command-line arguments.
// ABOUTME: Used for --env, --build-arg, and --build-secret flags.

use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseKvError {
    #[error("'{0}' must be in the format NAME=VALUE")]
    MissingSeparator(String),

    #[error("'{0}' has an empty name")]
    EmptyKey(String),
}

/// Parse `NAME=VALUE` pairs into a map. Later pairs win on duplicate names.
///
/// Only the first `=` separates name from value, so values may contain `=`.
pub fn parse_kv_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<HashMap<String, String>, ParseKvError> {
    let mut map = HashMap::with_capacity(pairs.len());

    for pair in pairs {
        let pair = pair.as_ref();
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| ParseKvError::MissingSeparator(pair.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(ParseKvError::EmptyKey(pair.to_string()));
        }
        map.insert(key.to_string(), value.to_string());
    }

    Ok(map)
}
