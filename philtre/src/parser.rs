//! The parser: token stream to raw parameter tree.
//!
//! Statements are line-oriented. A definition's value runs to the end of
//! its logical line; attribute bindings (`.name = value`) attach to the
//! most recent object, or to the enclosing scope when they open a scope
//! body; `!` disables the object it precedes; `include` at the start of a
//! line is carried as a directive definition until include processing.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::lexer::{scan, Token};
use crate::token::{Quote, Word};
use crate::tree::{none_word, NodeId, Session};

impl Session {
    /// Parses source text into a fresh unnamed root scope.
    ///
    /// `source` is a free-form description used in diagnostics, e.g.
    /// `file "a.phil"`.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed syntax and a schema error for
    /// invalid names or attribute values.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::Session;
    ///
    /// let mut session = Session::new();
    /// let root = session.parse("x = 1", None).unwrap();
    /// assert_eq!(session.name(session.children(root)[0]), "x");
    /// ```
    pub fn parse(&mut self, input: &str, source: Option<&str>) -> Result<NodeId> {
        let source: Option<Rc<str>> = source.map(Rc::from);
        let tokens = scan(input, source.clone())?;
        let root = self.new_root();
        let mut parser = Parser {
            session: self,
            tokens,
            pos: 0,
            source,
        };
        parser.parse_objects(root, true)?;
        Ok(root)
    }

    /// Reads and parses a file. When `process_includes` is set, `include`
    /// directives are expanded relative to the file's directory.
    ///
    /// # Errors
    ///
    /// I/O errors, parse errors, and include errors.
    pub fn parse_file(
        &mut self,
        path: &std::path::Path,
        process_includes: bool,
    ) -> Result<NodeId> {
        let input = std::fs::read_to_string(path)?;
        let source = format!("file \"{}\"", path.display());
        let root = self.parse(&input, Some(&source))?;
        if process_includes {
            let reference_dir = path.parent().map(std::path::Path::to_path_buf);
            return self.process_includes(root, reference_dir.as_deref());
        }
        Ok(root)
    }
}

struct Parser<'a> {
    session: &'a mut Session,
    tokens: Vec<Token>,
    pos: usize,
    source: Option<Rc<str>>,
}

/// True for an unquoted token with exactly this text.
fn is_plain(token: &Token, text: &str) -> bool {
    token.word.quote() == Quote::None && token.word.value() == text
}

fn is_structural(token: &Token) -> bool {
    token.word.quote() == Quote::None
        && matches!(token.word.value(), "{" | "}" | "=")
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn parse_error<T>(&self, message: String, anchor: Option<&Word>) -> Result<T> {
        Err(Error::Parse {
            message,
            location: anchor.map(Word::where_str).unwrap_or_default(),
        })
    }

    /// Value words from `pos` to the end of `logical_line`, stopping early
    /// at an unquoted brace.
    fn collect_value(&mut self, logical_line: usize) -> Vec<Word> {
        let mut words = Vec::new();
        while let Some(token) = self.peek() {
            if token.logical_line != logical_line
                || (token.word.quote() == Quote::None
                    && matches!(token.word.value(), "{" | "}"))
            {
                break;
            }
            words.push(self.bump().word);
        }
        words
    }

    fn parse_objects(&mut self, parent: NodeId, top_level: bool) -> Result<()> {
        let mut last_object: Option<NodeId> = None;
        let mut pending_disabled = false;
        loop {
            let Some(token) = self.peek() else {
                if top_level {
                    return Ok(());
                }
                return self.parse_error("missing \"}\"".to_string(), None);
            };
            if is_plain(token, "}") {
                if top_level {
                    let word = self.bump().word;
                    return self.parse_error("unexpected \"}\"".to_string(), Some(&word));
                }
                self.bump();
                return Ok(());
            }
            if is_plain(token, "!") {
                self.bump();
                pending_disabled = true;
                continue;
            }
            if is_structural(token) {
                let word = self.bump().word;
                return self.parse_error(format!("unexpected \"{word}\""), Some(&word));
            }
            if token.word.quote() == Quote::None && token.word.value().starts_with('.') {
                // attribute binding; inside a scope body with no preceding
                // sibling it applies to the enclosing scope itself
                let target = match last_object {
                    Some(id) => id,
                    None if !top_level => parent,
                    None => {
                        let word = self.bump().word;
                        return self.parse_error(
                            format!("no definition or scope before attribute \"{word}\""),
                            Some(&word),
                        );
                    }
                };
                self.parse_attribute(target)?;
                continue;
            }
            let object = self.parse_object(parent, &mut pending_disabled)?;
            last_object = Some(object);
        }
    }

    /// One `.name = value` binding.
    fn parse_attribute(&mut self, target: NodeId) -> Result<()> {
        let token = self.bump();
        let name = token.word.value()[1..].to_string();
        if name.is_empty() {
            return self.parse_error("missing attribute name after \".\"".to_string(), Some(&token.word));
        }
        match self.peek() {
            Some(t) if is_plain(t, "=") => {
                self.bump();
            }
            _ => {
                return self.parse_error(
                    format!("expected \"=\" after attribute \".{name}\""),
                    Some(&token.word),
                )
            }
        }
        let mut words = self.collect_value(token.logical_line);
        if words.is_empty() {
            words.push(none_word(token.word.line(), self.source.clone()));
        }
        self.session.assign_attribute(target, &name, &words)
    }

    /// One definition, scope, or include directive.
    fn parse_object(&mut self, parent: NodeId, pending_disabled: &mut bool) -> Result<NodeId> {
        let token = self.bump();
        let mut name = token.word.value().to_string();
        let mut disabled = std::mem::take(pending_disabled);
        if let Some(stripped) = name.strip_prefix('!') {
            disabled = true;
            name = stripped.to_string();
        }
        let name_word = token.word.clone();
        let logical_line = token.logical_line;

        // include directive: `include` not followed by `=`
        if name == "include" && !matches!(self.peek(), Some(t) if is_plain(t, "=")) {
            let words = self.collect_value(logical_line);
            if words.is_empty() {
                return self.parse_error(
                    "missing arguments after \"include\"".to_string(),
                    Some(&name_word),
                );
            }
            let id = self.session.new_include(name_word, words);
            self.session.node_mut(id).is_disabled = disabled;
            self.session.adopt(parent, id);
            return Ok(id);
        }

        match self.peek() {
            Some(t) if is_plain(t, "=") => {
                self.bump();
                let mut words = self.collect_value(logical_line);
                if words.is_empty() {
                    words.push(none_word(name_word.line(), self.source.clone()));
                }
                let id = self.session.new_definition(&name, Some(name_word), words)?;
                self.session.node_mut(id).is_disabled = disabled;
                self.session.adopt(parent, id);
                Ok(id)
            }
            _ => {
                let id = self.session.new_scope(&name, Some(name_word.clone()))?;
                self.session.node_mut(id).is_disabled = disabled;
                self.session.adopt(parent, id);
                // attributes may come between the name and the brace
                while let Some(token) = self.peek() {
                    if token.word.quote() == Quote::None
                        && token.word.value().starts_with('.')
                        && token.word.value().len() > 1
                    {
                        self.parse_attribute(id)?;
                    } else {
                        break;
                    }
                }
                match self.peek() {
                    Some(t) if is_plain(t, "{") => {
                        self.bump();
                    }
                    _ => {
                        return self.parse_error(
                            format!("expected \"{{\" or \"=\" after \"{name}\""),
                            Some(&name_word),
                        )
                    }
                }
                self.parse_objects(id, false)?;
                Ok(id)
            }
        }
    }
}
