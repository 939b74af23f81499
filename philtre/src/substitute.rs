//! Variable substitution: `$name` and `$(path)` references in definition
//! values.
//!
//! References resolve lexically: the search starts in the scope the
//! definition was declared in and walks outward, seeing only objects
//! declared before the reference (strictly smaller `primary_id`). A
//! leading dot inside `$(...)` anchors the lookup at the outermost scope.
//! Unresolved names fall back to the process environment. Substitution
//! cannot loop: every hop goes to a strictly earlier declaration.

use crate::error::{Error, Result};
use crate::fetch::UsageMarks;
use crate::token::{is_standard_identifier, Quote, Word};
use crate::tree::{NodeId, Session};

struct Fragment {
    is_variable: bool,
    /// Parenthesized reference syntax, for literal reconstruction.
    paren: bool,
    value: String,
}

struct Proxy {
    force_string: bool,
    have_variables: bool,
    fragments: Vec<Fragment>,
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_continuation(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Splits a word into literal and variable fragments.
fn scan_word(word: &Word) -> Result<Proxy> {
    let chars: Vec<char> = word.value().chars().collect();
    let mut fragments = Vec::new();
    let mut have_variables = false;
    let mut force_string = word.quote() != Quote::None;
    let mut buf = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c != '$' {
            buf.push(c);
            // an escaped dollar keeps its backslash
            if c == '\\' && chars.get(i + 1) == Some(&'$') {
                buf.push('$');
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        have_variables = true;
        if !buf.is_empty() {
            fragments.push(Fragment {
                is_variable: false,
                paren: false,
                value: std::mem::take(&mut buf),
            });
        }
        i += 1;
        match chars.get(i) {
            None => return word.syntax_error("improper use of \"$\" in "),
            Some('(') => {
                i += 1;
                let mut name = String::new();
                loop {
                    match chars.get(i) {
                        None => {
                            return word.syntax_error("missing closing parenthesis in ")
                        }
                        Some(')') => {
                            i += 1;
                            break;
                        }
                        Some(c) => {
                            name.push(*c);
                            i += 1;
                        }
                    }
                }
                let bare = name.strip_prefix('.').unwrap_or(&name);
                if !is_standard_identifier(bare) {
                    return word.syntax_error("improper variable name in ");
                }
                fragments.push(Fragment {
                    is_variable: true,
                    paren: true,
                    value: name,
                });
            }
            Some(&c) if is_identifier_start(c) => {
                let mut name = String::new();
                name.push(c);
                i += 1;
                loop {
                    match chars.get(i) {
                        Some(&c) if is_identifier_continuation(c) => {
                            name.push(c);
                            i += 1;
                        }
                        // a dot continues the reference only when another
                        // identifier follows, so a trailing dot stays text
                        Some('.')
                            if matches!(chars.get(i + 1), Some(&c) if is_identifier_start(c)) =>
                        {
                            name.push('.');
                            i += 1;
                        }
                        _ => break,
                    }
                }
                fragments.push(Fragment {
                    is_variable: true,
                    paren: false,
                    value: name,
                });
            }
            Some(_) => return word.syntax_error("improper variable name in "),
        }
    }
    if !buf.is_empty() {
        fragments.push(Fragment {
            is_variable: false,
            paren: false,
            value: buf,
        });
    }
    if fragments.len() > 1 {
        force_string = true;
    }
    Ok(Proxy {
        force_string,
        have_variables,
        fragments,
    })
}

impl Fragment {
    fn literal(&self) -> String {
        if self.paren {
            format!("$({})", self.value)
        } else {
            format!("${}", self.value)
        }
    }
}

impl Session {
    /// Resolves `$` references in a definition's value, returning the same
    /// node when nothing changes or a copy with substituted words.
    ///
    /// # Errors
    ///
    /// Substitution syntax errors, references to scopes, and undefined
    /// variables.
    pub fn resolve_variables(&mut self, id: NodeId) -> Result<NodeId> {
        let mut marks = UsageMarks::default();
        self.resolve_definition_variables(id, false, &mut marks)
    }

    /// In diff mode, references that do not resolve lexically stay literal
    /// instead of consulting the environment or failing, so diffs never
    /// capture process state. Lexically resolved sources are marked in
    /// `marks`: feeding a substitution counts as being used.
    pub(crate) fn resolve_definition_variables(
        &mut self,
        id: NodeId,
        diff_mode: bool,
        marks: &mut UsageMarks,
    ) -> Result<NodeId> {
        let words = self.node(id).definition().words.clone();
        let mut new_words = Vec::with_capacity(words.len());
        let mut changed = false;
        for word in &words {
            if word.quote() == Quote::Single {
                new_words.push(word.clone());
                continue;
            }
            let proxy = scan_word(word)?;
            if !proxy.have_variables {
                new_words.push(word.clone());
                continue;
            }
            changed = true;
            let mut results: Vec<Vec<Word>> = Vec::with_capacity(proxy.fragments.len());
            for fragment in &proxy.fragments {
                if !fragment.is_variable {
                    results.push(vec![Word::quoted(fragment.value.clone(), Quote::Double)]);
                    continue;
                }
                results.push(self.resolve_reference(id, fragment, word, diff_mode, marks)?);
            }
            if proxy.force_string {
                let value: String = results
                    .iter()
                    .map(|words| {
                        words
                            .iter()
                            .map(|w| w.value().to_string())
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .collect();
                new_words.push(Word::quoted(value, Quote::Double));
            } else {
                new_words.extend(results.into_iter().flatten());
            }
        }
        if !changed {
            return Ok(id);
        }
        Ok(self.copy_with_words(id, new_words))
    }

    fn resolve_reference(
        &mut self,
        id: NodeId,
        fragment: &Fragment,
        word: &Word,
        diff_mode: bool,
        marks: &mut UsageMarks,
    ) -> Result<Vec<Word>> {
        let stop_id = self.node(id).primary_id;
        if let Some(parent) = self.node(id).parent {
            if let Some(source) = self.lexical_get(parent, &fragment.value, stop_id) {
                if self.node(source).is_scope() {
                    return word.syntax_error(&format!(
                        "not a definition: \"{}\" in ",
                        fragment.value
                    ));
                }
                marks.mark(source);
                let resolved = self.resolve_definition_variables(source, false, marks)?;
                return Ok(self.node(resolved).definition().words.clone());
            }
        }
        if diff_mode {
            return Ok(vec![Word::new(fragment.literal())]);
        }
        if let Ok(value) = std::env::var(&fragment.value) {
            return Ok(vec![Word::with_source(
                value,
                Quote::Double,
                format!("environment: \"{}\"", fragment.value),
            )]);
        }
        Err(Error::UndefinedVariable {
            name: fragment.value.clone(),
            location: word.where_str(),
        })
    }

    /// Lexical lookup of a dotted path starting at `scope` and walking
    /// outward. Only objects with a `primary_id` strictly below `stop_id`
    /// are visible; within a scope the last eligible match wins. A leading
    /// dot anchors the search at the outermost scope.
    pub(crate) fn lexical_get(
        &self,
        scope: NodeId,
        path: &str,
        stop_id: u64,
    ) -> Option<NodeId> {
        if let Some(rest) = path.strip_prefix('.') {
            let mut root = scope;
            while let Some(parent) = self.node(root).parent {
                root = parent;
            }
            return self.lexical_find(root, rest, stop_id);
        }
        let mut current = scope;
        loop {
            if let Some(found) = self.lexical_find(current, path, stop_id) {
                return Some(found);
            }
            current = self.node(current).parent?;
        }
    }

    /// Finds `path` inside one scope. Candidates are tried from the latest
    /// eligible one backwards: when a dotted descent dead-ends in the
    /// nearest candidate, earlier same-named candidates get their turn.
    fn lexical_find(&self, scope: NodeId, path: &str, stop_id: u64) -> Option<NodeId> {
        let mut candidates = Vec::new();
        for &child in self.children(scope) {
            let node = self.node(child);
            if node.primary_id >= stop_id {
                break;
            }
            if node.is_disabled {
                continue;
            }
            if node.is_definition() {
                if node.name == path {
                    candidates.push(child);
                }
            } else if node.name == path
                || path
                    .strip_prefix(node.name.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
            {
                candidates.push(child);
            }
        }
        while let Some(candidate) = candidates.pop() {
            let name_len = self.node(candidate).name.len();
            if name_len == path.len() {
                return Some(candidate);
            }
            if let Some(found) = self.lexical_find(candidate, &path[name_len + 1..], stop_id) {
                return Some(found);
            }
        }
        None
    }

    /// Resolves a dotted path against a scope, returning every match with
    /// variables substituted (definitions may come back as copies).
    ///
    /// # Errors
    ///
    /// Substitution errors from resolving the matched definitions.
    pub fn get(&mut self, root: NodeId, path: &str) -> Result<Vec<NodeId>> {
        let matches = self.get_without_substitution(root, path);
        let mut result = Vec::with_capacity(matches.len());
        for id in matches {
            if self.node(id).is_scope() {
                result.push(id);
            } else {
                result.push(self.resolve_variables(id)?);
            }
        }
        Ok(result)
    }
}
