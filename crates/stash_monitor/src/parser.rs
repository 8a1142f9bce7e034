//! Pattern matching for admin log lines.
//!
//! Every function here is pure: a line goes in, a structured result or
//! `None` comes out. Lines that do not match are the normal case and are
//! never reported as errors.

use crate::error::PatternError;
use crate::types::LogEvent;
use once_cell::sync::Lazy;
use regex::Regex;

/// `Player "<name>" (id=<id> pos=<x, y, z>) removed <item> from <source> at <x, y, z>`
static EVENT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Player "(.+)" \(id=(.+) pos=<(.+)>\) removed (.+) from (.+) at <(.+)>"#)
        .expect("event pattern is valid")
});

/// Text following a storage keyword up to the first ` at `.
static LABEL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(.+?) at ").expect("label pattern is valid"));

/// Extracts the removal event from a log line.
///
/// Returns `None` for any line that does not follow the removal template.
pub fn parse_event(line: &str) -> Option<LogEvent> {
    let caps = EVENT_PATTERN.captures(line)?;
    Some(LogEvent {
        actor: caps[1].to_string(),
        actor_id: caps[2].to_string(),
        actor_position: caps[3].to_string(),
        item: caps[4].to_string(),
        source_label: caps[5].to_string(),
        storage_position: caps[6].to_string(),
    })
}

/// Extracts the descriptive storage label that follows `keyword` in `line`.
///
/// The label is the trimmed text between the first whole-word,
/// case-insensitive occurrence of the keyword and the next ` at `. Falls
/// back to the keyword itself when no such text exists.
pub fn extract_storage_type_label(line: &str, keyword: &str) -> String {
    match word_pattern(keyword) {
        Ok(word) => StorageKeyword {
            keyword: keyword.to_string(),
            word,
        }
        .label_in(line)
        .unwrap_or_else(|| keyword.to_string()),
        Err(_) => keyword.to_string(),
    }
}

fn word_pattern(keyword: &str) -> Result<Regex, PatternError> {
    if keyword.trim().is_empty() {
        return Err(PatternError::EmptyKeyword);
    }
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(keyword)))
        .map_err(|e| PatternError::InvalidKeyword(keyword.to_string(), e))
}

#[derive(Debug, Clone)]
struct StorageKeyword {
    keyword: String,
    word: Regex,
}

impl StorageKeyword {
    fn label_in(&self, line: &str) -> Option<String> {
        let found = self.word.find(line)?;
        let caps = LABEL_PATTERN.captures(&line[found.end()..])?;
        let label = caps[1].trim();
        (!label.is_empty()).then(|| label.to_string())
    }
}

/// A storage keyword found in a line together with its expanded label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageMatch {
    /// The configured keyword that matched
    pub keyword: String,
    /// The expanded label, or the keyword when no expansion was found
    pub label: String,
}

/// Matches lines against the configured list of storage-type keywords.
///
/// Keywords are tried in configuration order and the first one present as a
/// whole word (ignoring case) wins.
#[derive(Debug, Clone)]
pub struct StorageTypeMatcher {
    keywords: Vec<StorageKeyword>,
}

impl StorageTypeMatcher {
    pub fn new<I, S>(keywords: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|keyword| {
                let keyword = keyword.as_ref();
                Ok(StorageKeyword {
                    keyword: keyword.to_string(),
                    word: word_pattern(keyword)?,
                })
            })
            .collect::<Result<Vec<_>, PatternError>>()?;
        Ok(Self { keywords })
    }

    /// Returns the first configured keyword present in `line`.
    pub fn find(&self, line: &str) -> Option<StorageMatch> {
        let keyword = self.keywords.iter().find(|k| k.word.is_match(line))?;
        Some(StorageMatch {
            keyword: keyword.keyword.clone(),
            label: keyword
                .label_in(line)
                .unwrap_or_else(|| keyword.keyword.clone()),
        })
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
