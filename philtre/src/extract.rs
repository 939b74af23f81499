//! Typed extraction: the value graph produced from a tree and the format
//! direction that turns values back into a tree.
//!
//! [`Session::extract`] walks a scope and converts every definition value
//! through its `.type=` converter (untyped values stay as raw words);
//! [`Session::format`] does the reverse against a master schema, re-running
//! converter validation on the way. `.multiple=` subtrees extract into an
//! [`ExtractList`] regardless of how many concrete copies exist.

use std::rc::Rc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::fetch::FetchOptions;
use crate::token::{is_plain_auto, is_plain_none, Word};
use crate::tree::{NodeId, Session};
use crate::types::{CallProxy, CallSpec, TypeSpec};

/// A typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The `None` sentinel.
    None,
    /// The `Auto` sentinel.
    Auto,
    /// A boolean (`bool` type).
    Bool(bool),
    /// An integer (`int` type).
    Int(i64),
    /// A floating-point number (`float` type).
    Float(f64),
    /// A string (`str`, `qstr`, `key`, and `choice` types).
    Str(String),
    /// A filesystem path (`path` type).
    Path(String),
    /// A list of strings (`strings` and multi-choice types).
    Strings(Vec<String>),
    /// A list of integers (`ints` type).
    Ints(Vec<i64>),
    /// A list of floats (`floats` type).
    Floats(Vec<f64>),
    /// Raw tokens of an untyped or `words`-typed definition.
    Words(Vec<Word>),
    /// An extracted scope.
    Scope(ScopeExtract),
    /// The collected occurrences of a `.multiple=True` object.
    List(ExtractList),
}

impl Value {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Auto => "Auto",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Path(_) => "path",
            Self::Strings(_) => "strings",
            Self::Ints(_) => "ints",
            Self::Floats(_) => "floats",
            Self::Words(_) => "words",
            Self::Scope(_) => "scope",
            Self::List(_) => "list",
        }
    }

    /// True for the `None` sentinel.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The occurrences of a `.multiple=True` object, in tree order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractList {
    pub(crate) optional: Option<bool>,
    values: Vec<Value>,
}

impl ExtractList {
    pub(crate) fn new(optional: Option<bool>) -> Self {
        Self {
            optional,
            values: Vec::new(),
        }
    }

    /// Appends an occurrence.
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// The collected occurrences.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of occurrences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no occurrence was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Clone)]
enum Slot {
    Present(Value),
    /// A disabled object: the name is declared but carries no value.
    Missing,
}

/// The extracted form of a scope: an ordered name/value record that
/// rejects assignment to names the schema never declared.
#[derive(Clone)]
pub struct ScopeExtract {
    name: String,
    path: String,
    call: Option<Rc<CallProxy>>,
    entries: Vec<(String, Slot)>,
}

impl ScopeExtract {
    pub(crate) fn new(name: String, path: String, call: Option<Rc<CallProxy>>) -> Self {
        Self {
            name,
            path,
            call,
            entries: Vec::new(),
        }
    }

    /// The scope's own name (empty for a parse root).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dotted schema path of this scope.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn qualified(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}.{name}", self.path)
        }
    }

    fn slot(&self, name: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.entries
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    /// Looks up a value. `None` both for undeclared names and for declared
    /// names whose object was disabled.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.slot(name)? {
            Slot::Present(value) => Some(value),
            Slot::Missing => None,
        }
    }

    /// Mutable lookup.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self.slot_mut(name)? {
            Slot::Present(value) => Some(value),
            Slot::Missing => None,
        }
    }

    /// Replaces the value of a declared name.
    ///
    /// # Errors
    ///
    /// A schema error when the name was never declared; use
    /// [`inject`](Self::inject) to add new names.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        match self.slot_mut(name) {
            Some(slot) => {
                *slot = Slot::Present(value);
                Ok(())
            }
            None => Err(Error::Schema {
                message: format!(
                    "assignment to non-existing parameter: \"{}\"",
                    self.qualified(name)
                ),
                location: String::new(),
            }),
        }
    }

    /// Adds a value under a name the schema did not declare.
    ///
    /// # Errors
    ///
    /// A schema error when the name already exists.
    pub fn inject(&mut self, name: &str, value: Value) -> Result<()> {
        if self.slot(name).is_some() {
            return Err(Error::Schema {
                message: format!(
                    "injection of existing parameter: \"{}\"",
                    self.qualified(name)
                ),
                location: String::new(),
            });
        }
        self.entries
            .push((name.to_string(), Slot::Present(value)));
        Ok(())
    }

    /// Declared names with a value, in schema order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().filter_map(|(name, slot)| match slot {
            Slot::Present(value) => Some((name.as_str(), value)),
            Slot::Missing => None,
        })
    }

    /// Invokes the callable bound through the scope's `.call=` attribute.
    ///
    /// # Errors
    ///
    /// A schema error when no callable is bound, or whatever the callable
    /// itself reports.
    pub fn call(&self) -> Result<Value> {
        match &self.call {
            Some(proxy) => proxy.callable.invoke(self, &proxy.args),
            None => Err(Error::Schema {
                message: format!("scope \"{}\" has no .call binding", self.path),
                location: String::new(),
            }),
        }
    }

    /// Merges another extract of the same schema into this one: lists
    /// append the other's non-`None` occurrences, nested scopes join
    /// recursively, everything else is replaced.
    pub fn join(&mut self, other: ScopeExtract) {
        for (name, slot) in other.entries {
            let Slot::Present(value) = slot else { continue };
            match self.slot_mut(&name) {
                Some(Slot::Present(Value::List(existing))) => {
                    if let Value::List(incoming) = value {
                        while matches!(existing.values.first(), Some(Value::None)) {
                            existing.values.remove(0);
                        }
                        for element in incoming.values {
                            if !element.is_none() {
                                existing.values.push(element);
                            }
                        }
                    } else if !value.is_none() {
                        existing.values.push(value);
                    }
                }
                Some(Slot::Present(Value::Scope(existing)))
                    if matches!(value, Value::Scope(_)) =>
                {
                    if let Value::Scope(incoming) = value {
                        existing.join(incoming);
                    }
                }
                Some(slot) => *slot = Slot::Present(value),
                None => self.entries.push((name, Slot::Present(value))),
            }
        }
    }

    pub(crate) fn phil_set(
        &mut self,
        name: &str,
        optional: Option<bool>,
        multiple: Option<bool>,
        value: Option<Value>,
    ) {
        if multiple == Some(true) {
            if !matches!(self.slot(name), Some(Slot::Present(Value::List(_)))) {
                let list = ExtractList::new(optional);
                match self.slot_mut(name) {
                    Some(slot) => *slot = Slot::Present(Value::List(list)),
                    None => self
                        .entries
                        .push((name.to_string(), Slot::Present(Value::List(list)))),
                }
            }
            let Some(value) = value else { return };
            if value.is_none() && optional == Some(true) {
                return;
            }
            if let Some(Slot::Present(Value::List(list))) = self.slot_mut(name) {
                list.push(value);
            }
        } else {
            let slot = match value {
                None => Slot::Missing,
                Some(Value::Scope(incoming)) => {
                    if let Some(Slot::Present(Value::Scope(existing))) = self.slot_mut(name) {
                        existing.join(incoming);
                        return;
                    }
                    Slot::Present(Value::Scope(incoming))
                }
                Some(value) => Slot::Present(value),
            };
            match self.slot_mut(name) {
                Some(existing) => *existing = slot,
                None => self.entries.push((name.to_string(), slot)),
            }
        }
    }
}

impl std::fmt::Debug for ScopeExtract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in self.entries() {
            map.entry(&name, value);
        }
        map.finish()
    }
}

impl PartialEq for ScopeExtract {
    fn eq(&self, other: &Self) -> bool {
        // the call binding does not take part in value equality
        self.name == other.name
            && self
                .entries()
                .zip(other.entries())
                .all(|(a, b)| a == b)
            && self.entries().count() == other.entries().count()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_none(),
            Self::Auto => serializer.serialize_str("Auto"),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) | Self::Path(s) => serializer.serialize_str(s),
            Self::Strings(strings) => strings.serialize(serializer),
            Self::Ints(ints) => ints.serialize(serializer),
            Self::Floats(floats) => floats.serialize(serializer),
            Self::Words(words) => {
                let mut seq = serializer.serialize_seq(Some(words.len()))?;
                for word in words {
                    seq.serialize_element(word.value())?;
                }
                seq.end()
            }
            Self::Scope(scope) => scope.serialize(serializer),
            Self::List(list) => list.values().serialize(serializer),
        }
    }
}

impl Serialize for ScopeExtract {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, value) in self.entries() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Session {
    /// Extracts a scope into its typed value graph.
    ///
    /// # Errors
    ///
    /// Conversion errors from the definitions' `.type=` converters.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::{Session, Value};
    ///
    /// let mut session = Session::new();
    /// let root = session
    ///     .parse("count = 3\n  .type = int", None)
    ///     .unwrap();
    /// let extract = session.extract(root).unwrap();
    /// assert_eq!(extract.get("count"), Some(&Value::Int(3)));
    /// ```
    pub fn extract(&self, root: NodeId) -> Result<ScopeExtract> {
        self.extract_scope(root)
    }

    fn extract_scope(&self, id: NodeId) -> Result<ScopeExtract> {
        let node = self.node(id);
        let call = match &node.scope().call {
            Some(CallSpec::Proxy(proxy)) => Some(Rc::clone(proxy)),
            _ => None,
        };
        let mut result = ScopeExtract::new(node.name.clone(), self.full_path(id), call);
        for &child in self.children(id) {
            let child_node = self.node(child);
            if child_node.is_template < 0 {
                continue;
            }
            if child_node.is_definition() && child_node.definition().is_include {
                continue;
            }
            let value = if child_node.is_disabled || child_node.is_template > 0 {
                None
            } else if child_node.is_scope() {
                Some(Value::Scope(self.extract_scope(child)?))
            } else {
                Some(self.extract_definition(child)?)
            };
            result.phil_set(
                &child_node.name,
                child_node.attrs.optional,
                child_node.attrs.multiple,
                value,
            );
        }
        Ok(result)
    }

    pub(crate) fn extract_definition(&self, id: NodeId) -> Result<Value> {
        let data = self.node(id).definition();
        match &data.type_spec {
            Some(TypeSpec::Converter { converter, .. }) => {
                converter.from_words(&data.words, &self.definition_view(id))
            }
            _ => {
                if is_plain_none(&data.words) {
                    Ok(Value::None)
                } else if is_plain_auto(&data.words) {
                    Ok(Value::Auto)
                } else {
                    Ok(Value::Words(data.words.clone()))
                }
            }
        }
    }

    /// Builds a tree from a master schema and a value graph, re-running
    /// converter validation.
    ///
    /// # Errors
    ///
    /// Conversion errors for values that do not fit the schema's types.
    pub fn format(&mut self, master: NodeId, extract: &ScopeExtract) -> Result<NodeId> {
        self.format_scope(master, &Value::Scope(extract.clone()))
    }

    /// Checks a value graph against a master schema without keeping the
    /// formatted tree.
    ///
    /// # Errors
    ///
    /// The first conversion error encountered.
    pub fn validate(&mut self, master: NodeId, extract: &ScopeExtract) -> Result<()> {
        self.format(master, extract).map(|_| ())
    }

    /// Round trip: extract a tree and format it back against the same
    /// master, yielding an independent deep copy.
    ///
    /// # Errors
    ///
    /// Extraction or formatting errors.
    pub fn extract_format(&mut self, root: NodeId) -> Result<NodeId> {
        let extract = self.extract(root)?;
        self.format(root, &extract)
    }

    /// Formats a value graph against a master and immediately re-extracts
    /// it, producing a value graph detached from the input.
    ///
    /// # Errors
    ///
    /// Formatting or extraction errors.
    pub fn clone_extract(&mut self, master: NodeId, extract: &ScopeExtract) -> Result<ScopeExtract> {
        let formatted = self.format(master, extract)?;
        self.extract(formatted)
    }

    /// Tokenizes a candidate value string against a master definition and
    /// returns the typed value it would extract to. Intended for
    /// field-by-field form validation.
    ///
    /// # Errors
    ///
    /// Parse errors in the candidate text and conversion errors from the
    /// master's declared type.
    pub fn validate_definition(&mut self, master: NodeId, input: &str) -> Result<Value> {
        let fetched = self.fetch_candidate(master, input)?;
        self.extract_definition(fetched)
    }

    /// Validates a candidate value string and renders the accepted value
    /// back in the master's canonical spelling.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Session::validate_definition`].
    pub fn validate_and_format(&mut self, master: NodeId, input: &str) -> Result<String> {
        let fetched = self.fetch_candidate(master, input)?;
        let value = self.extract_definition(fetched)?;
        let formatted = self.format_definition(master, &value)?;
        let words: Vec<String> = self
            .node(formatted)
            .definition()
            .words
            .iter()
            .map(ToString::to_string)
            .collect();
        Ok(words.join(" "))
    }

    fn fetch_candidate(&mut self, master: NodeId, input: &str) -> Result<NodeId> {
        let name = self.node(master).name.clone();
        let master_root = self.new_root();
        let copy = self.shallow_copy(master);
        self.attach_child(master_root, copy);
        let source_root = self.parse(&format!("{name} = {input}\n"), Some("validation input"))?;
        let fetched = self.fetch(master_root, &[source_root], &FetchOptions::default())?;
        self.children(fetched.root)
            .first()
            .copied()
            .ok_or_else(|| Error::Schema {
                message: format!("validation of \"{name}\" produced no value"),
                location: String::new(),
            })
    }

    /// Formats one master scope. `value` is the matching [`Value::Scope`],
    /// or a `None`/`Auto` sentinel that propagates to every leaf below.
    fn format_scope(&mut self, master: NodeId, value: &Value) -> Result<NodeId> {
        let result = self.customized_copy(master, Vec::new());
        self.node_mut(result).is_template = 0;
        let scope_value = match value {
            Value::Scope(extract) => Some(extract),
            Value::None | Value::Auto => None,
            other => {
                return Err(Error::Conversion {
                    message: format!(
                        "scope \"{}\" cannot be formatted from a {} value",
                        self.full_path(master),
                        other.kind_name()
                    ),
                    location: String::new(),
                })
            }
        };
        let children = self.children(master).to_vec();
        let mut multiple_done: Vec<String> = Vec::new();
        for child in children {
            let child_node = self.node(child);
            if child_node.is_disabled || child_node.is_template < 0 {
                continue;
            }
            if child_node.is_definition() && child_node.definition().is_include {
                continue;
            }
            let name = child_node.name.clone();
            let multiple = child_node.attrs.multiple == Some(true);
            if multiple {
                if multiple_done.contains(&name) {
                    continue;
                }
                multiple_done.push(name.clone());
                let elements: Vec<Value> = match scope_value {
                    None => Vec::new(),
                    Some(extract) => match extract.slot(&name) {
                        None | Some(Slot::Missing) => continue,
                        Some(Slot::Present(Value::List(list))) => list.values().to_vec(),
                        Some(Slot::Present(single)) => vec![single.clone()],
                    },
                };
                let template = self.shallow_copy(child);
                self.node_mut(template).is_template =
                    if elements.is_empty() { 1 } else { -1 };
                self.attach_child(result, template);
                for element in &elements {
                    let formatted = self.format_object(child, element)?;
                    self.attach_child(result, formatted);
                }
            } else {
                let element = match scope_value {
                    None => value.clone(),
                    Some(extract) => match extract.slot(&name) {
                        None | Some(Slot::Missing) => continue,
                        Some(Slot::Present(element)) => element.clone(),
                    },
                };
                let formatted = self.format_object(child, &element)?;
                self.attach_child(result, formatted);
            }
        }
        Ok(result)
    }

    fn format_object(&mut self, master: NodeId, value: &Value) -> Result<NodeId> {
        if self.node(master).is_scope() {
            self.format_scope(master, value)
        } else {
            self.format_definition(master, value)
        }
    }

    pub(crate) fn format_definition(&mut self, master: NodeId, value: &Value) -> Result<NodeId> {
        let spec = self.node(master).definition().type_spec.clone();
        let words = match spec {
            Some(TypeSpec::Converter { converter, .. }) => {
                converter.as_words(value, &self.definition_view(master))?
            }
            _ => match value {
                Value::None => vec![Word::new("None")],
                Value::Auto => vec![Word::new("Auto")],
                Value::Words(words) => words.clone(),
                other => {
                    return Err(Error::Conversion {
                        message: format!(
                            "{}: cannot format a {} value without a declared type",
                            self.full_path(master),
                            other.kind_name()
                        ),
                        location: String::new(),
                    })
                }
            },
        };
        let id = self.copy_with_words(master, words);
        self.node_mut(id).is_template = 0;
        Ok(id)
    }
}
