use crate::{CourierError, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// An immutable routing key of dot-delimited alphanumeric words
///
/// Keys are case-sensitive and kept exactly as given; the empty key is legal
/// and represents the implicit root topic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic {
    key: String,
}

impl Topic {
    /// Create a new topic from a key matching `^[0-9a-zA-Z.]*$`
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(CourierError::topic(format!(
                "invalid topic key '{key}': expected dot-delimited alphanumeric words"
            )));
        }
        Ok(Self { key })
    }

    /// The implicit root topic (empty key)
    pub fn root() -> Self {
        Self { key: String::new() }
    }

    /// Get the topic key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Iterate over the dot-delimited words of the key
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.key.split('.')
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

impl FromStr for Topic {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Topic {
    type Error = CourierError;

    fn try_from(key: String) -> Result<Self> {
        Self::new(key)
    }
}

impl TryFrom<&str> for Topic {
    type Error = CourierError;

    fn try_from(key: &str) -> Result<Self> {
        Self::new(key)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.key
    }
}

/// A wildcard matching rule over topics
///
/// A pattern is a string of dot-delimited segments where each segment is an
/// alphanumeric word (possibly empty), `*` (match exactly one word) or `#`
/// (match zero or more consecutive words, crossing dots). Matching is
/// whole-string: a pattern never matches a prefix or substring of a key.
///
/// The matcher is compiled to an anchored [`Regex`] on the first
/// [`is_match`](TopicPattern::is_match) call and cached for the pattern's
/// lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TopicPattern {
    pattern: String,
    compiled: OnceCell<Regex>,
}

impl TopicPattern {
    /// Create a new topic pattern, validating the segment grammar
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let pattern = pattern.into();
        for segment in pattern.split('.') {
            let is_word = segment == "*"
                || segment == "#"
                || segment.chars().all(|c| c.is_ascii_alphanumeric());
            if !is_word {
                return Err(CourierError::pattern(format!(
                    "invalid segment '{segment}' in pattern '{pattern}': \
                     expected an alphanumeric word, '*' or '#'"
                )));
            }
        }
        Ok(Self {
            pattern,
            compiled: OnceCell::new(),
        })
    }

    /// Get the pattern string
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if the pattern is exact (no wildcards)
    pub fn is_exact(&self) -> bool {
        !self.is_wildcard()
    }

    /// Check if the pattern contains wildcard segments
    pub fn is_wildcard(&self) -> bool {
        self.pattern.split('.').any(|s| s == "*" || s == "#")
    }

    /// Check whether the full key of `topic` matches this pattern
    pub fn is_match(&self, topic: &Topic) -> bool {
        let matched = self.compiled().is_match(topic.key());
        trace!(
            pattern = %self.pattern,
            topic = %topic.key(),
            matched,
            "evaluated topic pattern"
        );
        matched
    }

    fn compiled(&self) -> &Regex {
        self.compiled.get_or_init(|| {
            Regex::new(&self.translate())
                .expect("validated pattern translates to a well-formed regex")
        })
    }

    /// Translate the pattern into an anchored regular expression
    ///
    /// Literal segments are escaped verbatim and joined by literal dots. `*`
    /// becomes `[^.]*`, one word that can never absorb a dot. `#` becomes a
    /// group that also swallows its adjacent dot separator, so it can span
    /// zero words: `a.#` matches both `a` and `a.b.c`.
    fn translate(&self) -> String {
        let segments: Vec<&str> = self.pattern.split('.').collect();
        let mut regex = String::from("^");
        let mut need_separator = false;
        for (index, segment) in segments.iter().enumerate() {
            match *segment {
                "#" if need_separator => regex.push_str(r"(?:\..*)?"),
                "#" if index + 1 == segments.len() => regex.push_str(".*"),
                "#" => regex.push_str(r"(?:.*\.)?"),
                "*" => {
                    if need_separator {
                        regex.push_str(r"\.");
                    }
                    regex.push_str("[^.]*");
                    need_separator = true;
                }
                literal => {
                    if need_separator {
                        regex.push_str(r"\.");
                    }
                    regex.push_str(&regex::escape(literal));
                    need_separator = true;
                }
            }
        }
        regex.push('$');
        regex
    }
}

impl PartialEq for TopicPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for TopicPattern {}

impl std::hash::Hash for TopicPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

impl fmt::Display for TopicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl FromStr for TopicPattern {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TopicPattern {
    type Error = CourierError;

    fn try_from(pattern: String) -> Result<Self> {
        Self::new(pattern)
    }
}

impl TryFrom<&str> for TopicPattern {
    type Error = CourierError;

    fn try_from(pattern: &str) -> Result<Self> {
        Self::new(pattern)
    }
}

impl From<TopicPattern> for String {
    fn from(pattern: TopicPattern) -> Self {
        pattern.pattern
    }
}
