//! Word tokens and their source locations.
//!
//! A [`Word`] is the atomic value of the language: a piece of text with an
//! optional quoting style and enough location metadata to produce useful
//! diagnostics. Words are immutable once produced.

use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Quoting style of a word.
///
/// Single-quoted words are verbatim: variable substitution is disabled
/// inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    /// An unquoted word.
    None,
    /// A double-quoted word (`"..."`); substitution still applies.
    Double,
    /// A single-quoted word (`'...'`); substitution is disabled.
    Single,
}

/// A single token: raw text, quoting style, and source location.
///
/// # Examples
///
/// ```
/// use philtre::{Quote, Word};
///
/// let word = Word::new("hello");
/// assert_eq!(word.value(), "hello");
/// assert_eq!(word.quote(), Quote::None);
///
/// let quoted = Word::quoted("two words", Quote::Double);
/// assert_eq!(quoted.to_string(), "\"two words\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    value: String,
    quote: Quote,
    line: Option<usize>,
    source: Option<Rc<str>>,
}

impl Word {
    /// Creates an unquoted word with no location.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote: Quote::None,
            line: None,
            source: None,
        }
    }

    /// Creates a word with an explicit quoting style and no location.
    #[must_use]
    pub fn quoted(value: impl Into<String>, quote: Quote) -> Self {
        Self {
            value: value.into(),
            quote,
            line: None,
            source: None,
        }
    }

    /// Creates a word with full location metadata.
    #[must_use]
    pub fn with_location(
        value: impl Into<String>,
        quote: Quote,
        line: usize,
        source: Option<Rc<str>>,
    ) -> Self {
        Self {
            value: value.into(),
            quote,
            line: Some(line),
            source,
        }
    }

    /// Creates a word tagged with a free-form source description only
    /// (used for values synthesized from the environment).
    #[must_use]
    pub fn with_source(value: impl Into<String>, quote: Quote, source: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote,
            line: None,
            source: Some(Rc::from(source.into().as_str())),
        }
    }

    /// The raw text of the word, without quotes.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The quoting style of the word.
    #[must_use]
    pub fn quote(&self) -> Quote {
        self.quote
    }

    /// The physical source line, if known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// A diagnostic suffix identifying where this word came from, e.g.
    /// ` (file "a.phil", line 3)`. Empty when nothing is known.
    #[must_use]
    pub fn where_str(&self) -> String {
        match (&self.source, self.line) {
            (Some(source), Some(line)) => format!(" ({source}, line {line})"),
            (Some(source), None) => format!(" ({source})"),
            (None, Some(line)) => format!(" (line {line})"),
            (None, None) => String::new(),
        }
    }

    /// Raises a substitution syntax error anchored at this word.
    pub(crate) fn syntax_error<T>(&self, message: &str) -> Result<T> {
        Err(Error::Substitution {
            message: format!("{message}\"{}\"", self),
            location: self.where_str(),
        })
    }
}

impl fmt::Display for Word {
    /// Formats the word as it would appear in serialized source text,
    /// re-quoting and escaping as necessary.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Quote::None => write!(f, "{}", self.value),
            Quote::Double => write!(f, "\"{}\"", escape(&self.value, '"')),
            Quote::Single => write!(f, "'{}'", escape(&self.value, '\'')),
        }
    }
}

fn escape(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == quote || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns true for a plain unquoted `None` value (a single word).
#[must_use]
pub(crate) fn is_plain_none(words: &[Word]) -> bool {
    words.len() == 1 && words[0].quote == Quote::None && words[0].value == "None"
}

/// Returns true for a plain unquoted `Auto` value (a single word).
#[must_use]
pub(crate) fn is_plain_auto(words: &[Word]) -> bool {
    words.len() == 1 && words[0].quote == Quote::None && words[0].value == "Auto"
}

/// Checks whether `string` is a standard identifier: dot-separated,
/// non-empty segments starting with a letter or underscore and continuing
/// with letters, digits, or underscores.
#[must_use]
pub(crate) fn is_standard_identifier(string: &str) -> bool {
    if string.is_empty() {
        return false;
    }
    string.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

/// Reserved dunder-style identifiers (`__name__`) may not be used as
/// definition or scope names.
#[must_use]
pub(crate) fn is_reserved_identifier(string: &str) -> bool {
    string.len() >= 5 && string.starts_with("__") && string.ends_with("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_display_unquoted() {
        assert_eq!(Word::new("abc").to_string(), "abc");
    }

    #[test]
    fn test_word_display_quoted() {
        assert_eq!(
            Word::quoted("a b", Quote::Double).to_string(),
            "\"a b\""
        );
        assert_eq!(Word::quoted("a b", Quote::Single).to_string(), "'a b'");
    }

    #[test]
    fn test_word_display_escapes() {
        assert_eq!(
            Word::quoted("say \"hi\"", Quote::Double).to_string(),
            "\"say \\\"hi\\\"\""
        );
        assert_eq!(
            Word::quoted("back\\slash", Quote::Double).to_string(),
            "\"back\\\\slash\""
        );
    }

    #[test]
    fn test_where_str() {
        let word = Word::with_location("x", Quote::None, 7, Some(Rc::from("file \"a.phil\"")));
        assert_eq!(word.where_str(), " (file \"a.phil\", line 7)");

        let word = Word::with_location("x", Quote::None, 7, None);
        assert_eq!(word.where_str(), " (line 7)");

        assert_eq!(Word::new("x").where_str(), "");
    }

    #[test]
    fn test_is_plain_none_and_auto() {
        assert!(is_plain_none(&[Word::new("None")]));
        assert!(!is_plain_none(&[Word::quoted("None", Quote::Double)]));
        assert!(!is_plain_none(&[Word::new("None"), Word::new("None")]));
        assert!(is_plain_auto(&[Word::new("Auto")]));
        assert!(!is_plain_auto(&[Word::new("auto")]));
    }

    #[test]
    fn test_is_standard_identifier() {
        assert!(is_standard_identifier("abc"));
        assert!(is_standard_identifier("_a1.b2.c3"));
        assert!(!is_standard_identifier(""));
        assert!(!is_standard_identifier("1abc"));
        assert!(!is_standard_identifier("a..b"));
        assert!(!is_standard_identifier("a.b."));
        assert!(!is_standard_identifier("a-b"));
    }

    #[test]
    fn test_is_reserved_identifier() {
        assert!(is_reserved_identifier("__foo__"));
        assert!(is_reserved_identifier("_____"));
        assert!(!is_reserved_identifier("____"));
        assert!(!is_reserved_identifier("__foo"));
        assert!(!is_reserved_identifier("foo"));
    }
}
