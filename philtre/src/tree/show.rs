//! Deterministic pretty-printing of parameter trees.
//!
//! Output re-parses to the same tree: quoting is preserved, dotted-name
//! chains created by adoption print merged (`a.b.c = 1`), disabled objects
//! keep their `!` prefix, and long value lines wrap with a `\` line
//! continuation.

use std::fmt::Write as _;

use crate::token::Word;
use crate::tree::{Body, NodeId, Session};
use crate::types::CallSpec;

/// Controls what [`Session::as_str`] emits.
#[derive(Debug, Clone)]
pub struct ShowOptions {
    /// Hide objects whose `.expert_level=` exceeds this (None shows all).
    pub expert_level: Option<i64>,
    /// 0 = values only, 1 = help and alias, 2 = all set attributes
    /// (templates become visible), 3 = every attribute including unset
    /// ones (deprecated objects become visible).
    pub attributes_level: i64,
    /// Maximum output line width before values wrap.
    pub print_width: usize,
}

impl Default for ShowOptions {
    fn default() -> Self {
        Self {
            expert_level: None,
            attributes_level: 0,
            print_width: 79,
        }
    }
}

fn needs_quoting(text: &str) -> bool {
    text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '{' | '}' | '=' | '#' | '"' | '\''))
}

fn attr_text(value: &str) -> String {
    if needs_quoting(value) {
        Word::quoted(value, crate::token::Quote::Double).to_string()
    } else {
        value.to_string()
    }
}

fn opt_str(value: Option<&str>) -> Option<String> {
    value.map(attr_text)
}

fn opt_bool(value: Option<bool>) -> Option<String> {
    value.map(|b| if b { "True" } else { "False" }.to_string())
}

fn opt_int(value: Option<i64>) -> Option<String> {
    value.map(|i| i.to_string())
}

impl Session {
    /// Serializes the children of `root` as source text.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::{Session, ShowOptions};
    ///
    /// let mut session = Session::new();
    /// let root = session.parse("a = 1\ns { b = 2 }", None).unwrap();
    /// assert_eq!(
    ///     session.as_str(root, &ShowOptions::default()),
    ///     "a = 1\ns {\n  b = 2\n}\n"
    /// );
    /// ```
    #[must_use]
    pub fn as_str(&self, root: NodeId, options: &ShowOptions) -> String {
        let mut out = String::new();
        for &child in self.children(root) {
            self.show_object(child, 0, options, &mut out);
        }
        out
    }

    /// Canonical single-object rendering used for value comparison;
    /// attributes and line wrapping are irrelevant there.
    #[must_use]
    pub(crate) fn object_as_str(&self, id: NodeId) -> String {
        let options = ShowOptions {
            expert_level: None,
            attributes_level: 0,
            print_width: usize::MAX,
        };
        let mut out = String::new();
        self.show_object(id, 0, &options, &mut out);
        out
    }

    fn show_object(&self, id: NodeId, depth: usize, options: &ShowOptions, out: &mut String) {
        let node = self.node(id);
        if node.is_template < 0 && options.attributes_level < 2 {
            return;
        }
        if node.attrs.deprecated && options.attributes_level < 3 {
            return;
        }
        if let (Some(max), Some(level)) = (options.expert_level, node.attrs.expert_level) {
            if level > max {
                return;
            }
        }

        // collapse synthetic dotted-name chains
        let mut display = node.name.clone();
        let mut target = id;
        loop {
            let t = self.node(target);
            let collapses = t.is_scope()
                && t.scope().children.len() == 1
                && self.node(t.scope().children[0]).merge_names;
            if !collapses {
                break;
            }
            let child = self.node(target).scope().children[0];
            display.push('.');
            display.push_str(&self.node(child).name);
            target = child;
        }
        let target_node = self.node(target);
        let indent = "  ".repeat(depth);
        let bang = if node.is_disabled { "!" } else { "" };

        match &target_node.body {
            Body::Definition(data) => {
                if target_node.attrs.deprecated {
                    let _ = writeln!(out, "{indent}# WARNING: deprecated parameter");
                }
                let values: Vec<String> =
                    data.words.iter().map(ToString::to_string).collect();
                let head = if data.is_include {
                    format!("{indent}{bang}{display}")
                } else {
                    format!("{indent}{bang}{display} =")
                };
                wrap_line(&head, &values, options.print_width, out);
                self.show_attributes(target, depth + 1, options, out);
            }
            Body::Scope(_) => {
                let mut attrs = String::new();
                self.show_attributes(target, depth + 1, options, &mut attrs);
                if attrs.is_empty() {
                    let _ = writeln!(out, "{indent}{bang}{display} {{");
                } else {
                    let _ = writeln!(out, "{indent}{bang}{display}");
                    out.push_str(&attrs);
                    let _ = writeln!(out, "{indent}{{");
                }
                for &child in self.children(target) {
                    self.show_object(child, depth + 1, options, out);
                }
                let _ = writeln!(out, "{indent}}}");
            }
        }
    }

    fn show_attributes(&self, id: NodeId, depth: usize, options: &ShowOptions, out: &mut String) {
        let level = options.attributes_level;
        if level < 1 {
            return;
        }
        let node = self.node(id);
        let mut attrs: Vec<(&str, Option<String>)> = Vec::new();
        if level >= 2 {
            attrs.push(("help", opt_str(node.attrs.help.as_deref())));
            attrs.push(("caption", opt_str(node.attrs.caption.as_deref())));
            attrs.push((
                "short_caption",
                opt_str(node.attrs.short_caption.as_deref()),
            ));
            attrs.push(("optional", opt_bool(node.attrs.optional)));
            match &node.body {
                Body::Definition(data) => {
                    attrs.push((
                        "type",
                        data.type_spec.as_ref().map(ToString::to_string),
                    ));
                    attrs.push(("multiple", opt_bool(node.attrs.multiple)));
                    attrs.push(("input_size", opt_int(data.input_size)));
                }
                Body::Scope(data) => {
                    attrs.push(("call", data.call.as_ref().map(CallSpec::to_string)));
                    attrs.push(("multiple", opt_bool(node.attrs.multiple)));
                    attrs.push((
                        "sequential_format",
                        opt_str(data.sequential_format.as_deref()),
                    ));
                    attrs.push(("disable_add", opt_bool(data.disable_add)));
                    attrs.push(("disable_delete", opt_bool(data.disable_delete)));
                }
            }
            attrs.push(("style", opt_str(node.attrs.style.as_deref())));
            attrs.push(("expert_level", opt_int(node.attrs.expert_level)));
            if node.attrs.deprecated {
                attrs.push(("deprecated", Some("True".to_string())));
            }
            attrs.push(("alias", opt_str(node.attrs.alias.as_deref())));
        } else {
            attrs.push(("help", opt_str(node.attrs.help.as_deref())));
            attrs.push(("alias", opt_str(node.attrs.alias.as_deref())));
        }
        let indent = "  ".repeat(depth);
        for (name, value) in attrs {
            match value {
                Some(value) => {
                    let head = format!("{indent}.{name} =");
                    wrap_line(&head, &[value], options.print_width, out);
                }
                None if level >= 3 => {
                    let _ = writeln!(out, "{indent}.{name} = None");
                }
                None => {}
            }
        }
    }
}

/// Emits `head value value ...`, wrapping with a `\` continuation when a
/// line would exceed `width`. Continuation lines align with the first
/// value.
fn wrap_line(head: &str, values: &[String], width: usize, out: &mut String) {
    let mut line = head.to_string();
    let align = head.len() + 1;
    let mut first_on_line = true;
    for value in values {
        let projected = line.len() + 1 + value.len();
        if !first_on_line && projected + 2 > width {
            let _ = writeln!(out, "{line} \\");
            line = " ".repeat(align.min(width / 2));
            line.push_str(value);
        } else {
            line.push(' ');
            line.push_str(value);
        }
        first_on_line = false;
    }
    let _ = writeln!(out, "{line}");
}
