//! The lexer: splits raw source text into [`Word`] tokens.
//!
//! The token stream is line-oriented: definition values run to the end of
//! the logical line, so every token carries both its physical line (for
//! diagnostics) and its logical line (for statement grouping). A `\`
//! immediately before a line break joins the next physical line onto the
//! current logical one.
//!
//! Structural characters `{`, `}`, and `=` always form single-character
//! words; `#` starts a comment running to the end of the line.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::token::{Quote, Word};

/// A lexed token: the word plus the logical line it belongs to.
#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub word: Word,
    pub logical_line: usize,
}

/// Characters that terminate an unquoted word.
fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '{' | '}' | '=' | '#' | '"' | '\'')
}

fn location(source: &Option<Rc<str>>, line: usize) -> String {
    match source {
        Some(source) => format!(" ({source}, line {line})"),
        None => format!(" (line {line})"),
    }
}

/// Scans `input` into a token stream.
///
/// `source` is a free-form description of where the text came from
/// (e.g. `file "a.phil"`) used in diagnostics.
pub(crate) fn scan(input: &str, source: Option<Rc<str>>) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    let mut physical = 1usize;
    let mut logical = 1usize;

    while i < chars.len() {
        let c = chars[i];
        if c == '\n' {
            physical += 1;
            logical += 1;
            i += 1;
        } else if c == '\r' {
            i += 1;
        } else if c.is_whitespace() {
            i += 1;
        } else if c == '#' {
            while i < chars.len() && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '{' || c == '}' || c == '=' {
            tokens.push(Token {
                word: Word::with_location(c.to_string(), Quote::None, physical, source.clone()),
                logical_line: logical,
            });
            i += 1;
        } else if c == '"' || c == '\'' {
            let quote_char = c;
            let start_line = physical;
            i += 1;
            let mut value = String::new();
            loop {
                if i >= chars.len() || chars[i] == '\n' {
                    return Err(Error::Parse {
                        message: format!("unterminated {quote_char}...{quote_char} string"),
                        location: location(&source, start_line),
                    });
                }
                let c = chars[i];
                if c == '\\' && i + 1 < chars.len() && (chars[i + 1] == quote_char || chars[i + 1] == '\\') {
                    value.push(chars[i + 1]);
                    i += 2;
                } else if c == quote_char {
                    i += 1;
                    break;
                } else {
                    value.push(c);
                    i += 1;
                }
            }
            let quote = if quote_char == '"' { Quote::Double } else { Quote::Single };
            tokens.push(Token {
                word: Word::with_location(value, quote, start_line, source.clone()),
                logical_line: logical,
            });
        } else if c == '\\' && at_line_break(&chars, i + 1) {
            // line continuation: swallow the backslash and the break
            i += 1;
            if i < chars.len() && chars[i] == '\r' {
                i += 1;
            }
            if i < chars.len() && chars[i] == '\n' {
                i += 1;
                physical += 1;
            }
        } else {
            let start_line = physical;
            let mut value = String::new();
            while i < chars.len() {
                let c = chars[i];
                if is_word_boundary(c) {
                    break;
                }
                if c == '\\' && at_line_break(&chars, i + 1) {
                    break;
                }
                value.push(c);
                i += 1;
            }
            tokens.push(Token {
                word: Word::with_location(value, Quote::None, start_line, source.clone()),
                logical_line: logical,
            });
        }
    }
    Ok(tokens)
}

fn at_line_break(chars: &[char], i: usize) -> bool {
    if i >= chars.len() {
        return true;
    }
    chars[i] == '\n' || (chars[i] == '\r' && i + 1 < chars.len() && chars[i + 1] == '\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tokens: &[Token]) -> Vec<String> {
        tokens.iter().map(|t| t.word.value().to_string()).collect()
    }

    #[test]
    fn test_scan_simple_definition() {
        let tokens = scan("a = 1 2", None).unwrap();
        assert_eq!(values(&tokens), ["a", "=", "1", "2"]);
        assert!(tokens.iter().all(|t| t.logical_line == 1));
    }

    #[test]
    fn test_scan_braces_are_single_tokens() {
        let tokens = scan("a{b=1}", None).unwrap();
        assert_eq!(values(&tokens), ["a", "{", "b", "=", "1", "}"]);
    }

    #[test]
    fn test_scan_comment_runs_to_end_of_line() {
        let tokens = scan("a = 1 # trailing\nb = 2", None).unwrap();
        assert_eq!(values(&tokens), ["a", "=", "1", "b", "=", "2"]);
        assert_eq!(tokens[3].logical_line, 2);
    }

    #[test]
    fn test_scan_quoted_strings() {
        let tokens = scan("a = \"two words\" 'no $subst'", None).unwrap();
        assert_eq!(tokens[2].word.value(), "two words");
        assert_eq!(tokens[2].word.quote(), Quote::Double);
        assert_eq!(tokens[3].word.value(), "no $subst");
        assert_eq!(tokens[3].word.quote(), Quote::Single);
    }

    #[test]
    fn test_scan_escapes_in_quoted_string() {
        let tokens = scan(r#"a = "say \"hi\" \\ back""#, None).unwrap();
        assert_eq!(tokens[2].word.value(), "say \"hi\" \\ back");
    }

    #[test]
    fn test_scan_unterminated_string_is_error() {
        let err = scan("a = \"oops\nb = 2", None).unwrap_err();
        assert!(format!("{err}").contains("unterminated"));
    }

    #[test]
    fn test_scan_line_continuation() {
        let tokens = scan("a = 1 \\\n    2\nb = 3", None).unwrap();
        assert_eq!(values(&tokens), ["a", "=", "1", "2", "b", "=", "3"]);
        assert_eq!(tokens[3].logical_line, 1);
        assert_eq!(tokens[4].logical_line, 2);
        // physical lines still advance for diagnostics
        assert_eq!(tokens[3].word.line(), Some(2));
    }

    #[test]
    fn test_scan_continuation_attached_to_word() {
        let tokens = scan("a = long_value\\\nmore", None).unwrap();
        assert_eq!(values(&tokens), ["a", "=", "long_value", "more"]);
        assert_eq!(tokens[3].logical_line, 1);
    }

    #[test]
    fn test_scan_backslash_inside_word_is_literal() {
        let tokens = scan(r"a = c:\temp\file", None).unwrap();
        assert_eq!(tokens[2].word.value(), r"c:\temp\file");
    }

    #[test]
    fn test_scan_source_info_in_location() {
        let tokens = scan("a = 1", Some(Rc::from("file \"x.phil\""))).unwrap();
        assert_eq!(tokens[0].word.where_str(), " (file \"x.phil\", line 1)");
    }

    #[test]
    fn test_scan_dollar_paths_are_plain_word_chars() {
        let tokens = scan("a = $(x.y)/data", None).unwrap();
        assert_eq!(tokens[2].word.value(), "$(x.y)/data");
    }
}
