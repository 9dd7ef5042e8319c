// src/analyze/extract.rs
//! Pulls JSON out of free-form oracle text. Both scans are greedy: they span
//! from the first opening delimiter to the last closing one.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No candidate span in the text.
    NoJson,
    /// A span was found but did not parse into the expected shape.
    Parse(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::NoJson => write!(f, "no JSON found in oracle response"),
            ExtractError::Parse(e) => write!(f, "oracle JSON did not parse: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {}

fn re_id_groups() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[\[.*\]\]").unwrap())
}

fn re_object() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap())
}

/// First `[[ ... ]]` span parsed as an array of integer-id arrays.
pub fn id_groups(text: &str) -> Result<Vec<Vec<i64>>, ExtractError> {
    let span = re_id_groups()
        .find(text)
        .ok_or(ExtractError::NoJson)?
        .as_str();
    serde_json::from_str(span).map_err(|e| ExtractError::Parse(e.to_string()))
}

/// First `{ ... }` span parsed as `T`.
pub fn object<T: DeserializeOwned>(text: &str) -> Result<T, ExtractError> {
    let span = re_object().find(text).ok_or(ExtractError::NoJson)?.as_str();
    serde_json::from_str(span).map_err(|e| ExtractError::Parse(e.to_string()))
}
