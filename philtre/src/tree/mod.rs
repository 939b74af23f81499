//! The parameter tree: an arena [`Session`] owning every node.
//!
//! All scopes and definitions of every parsed input live in one flat node
//! arena and are addressed by [`NodeId`]. Copies are shallow by default:
//! a copied scope gets its own node but shares the child id list, which is
//! what makes merging cheap. Each node records the scope it was originally
//! declared in (its parent link) and a session-wide `primary_id` counter
//! value; lexical variable lookup walks parent links and only sees nodes
//! with a strictly smaller `primary_id` than the reference.

pub(crate) mod show;

#[cfg(all(test, feature = "property-tests"))]
mod proptests;

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::symbols::{NullResolver, SymbolResolver};
use crate::token::{
    is_plain_auto, is_plain_none, is_reserved_identifier, is_standard_identifier, Quote, Word,
};
use crate::types::{
    join_word_values, CallProxy, CallSpec, Converter, ConverterFactory, ConverterRegistry,
    TypeResolution, TypeSpec,
};

/// Handle to a node in a [`Session`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// Attributes shared by definitions and scopes.
#[derive(Debug, Default, Clone)]
pub(crate) struct CommonAttributes {
    pub help: Option<String>,
    pub caption: Option<String>,
    pub short_caption: Option<String>,
    pub optional: Option<bool>,
    pub multiple: Option<bool>,
    pub style: Option<String>,
    pub expert_level: Option<i64>,
    pub deprecated: bool,
    pub alias: Option<String>,
}

/// Definition-specific payload.
#[derive(Clone)]
pub(crate) struct DefinitionData {
    /// The value tokens; never empty (an empty value parses as `None`).
    pub words: Vec<Word>,
    /// Resolved `.type=` attribute.
    pub type_spec: Option<TypeSpec>,
    /// `.input_size=` hint for interactive frontends.
    pub input_size: Option<i64>,
    /// True for unprocessed `include` directives carried as definitions.
    pub is_include: bool,
}

/// Scope-specific payload.
#[derive(Clone)]
pub(crate) struct ScopeData {
    pub children: Vec<NodeId>,
    pub call: Option<CallSpec>,
    pub sequential_format: Option<String>,
    pub disable_add: Option<bool>,
    pub disable_delete: Option<bool>,
}

impl ScopeData {
    fn empty() -> Self {
        Self {
            children: Vec::new(),
            call: None,
            sequential_format: None,
            disable_add: None,
            disable_delete: None,
        }
    }
}

#[derive(Clone)]
pub(crate) enum Body {
    Definition(DefinitionData),
    Scope(ScopeData),
}

/// One tree node. `is_template` is a tri-state: 0 for concrete nodes, 1
/// for a template that produced no copies, -1 for a template that did.
#[derive(Clone)]
pub(crate) struct Node {
    pub name: String,
    pub name_word: Option<Word>,
    pub parent: Option<NodeId>,
    pub primary_id: u64,
    pub is_disabled: bool,
    pub is_template: i8,
    pub merge_names: bool,
    pub attrs: CommonAttributes,
    pub body: Body,
}

impl Node {
    pub(crate) fn is_scope(&self) -> bool {
        matches!(self.body, Body::Scope(_))
    }

    pub(crate) fn is_definition(&self) -> bool {
        matches!(self.body, Body::Definition(_))
    }

    pub(crate) fn kind(&self) -> &'static str {
        if self.is_scope() {
            "scope"
        } else {
            "definition"
        }
    }

    pub(crate) fn scope(&self) -> &ScopeData {
        match &self.body {
            Body::Scope(data) => data,
            Body::Definition(_) => panic!("node is not a scope"),
        }
    }

    pub(crate) fn scope_mut(&mut self) -> &mut ScopeData {
        match &mut self.body {
            Body::Scope(data) => data,
            Body::Definition(_) => panic!("node is not a scope"),
        }
    }

    pub(crate) fn definition(&self) -> &DefinitionData {
        match &self.body {
            Body::Definition(data) => data,
            Body::Scope(_) => panic!("node is not a definition"),
        }
    }

    pub(crate) fn definition_mut(&mut self) -> &mut DefinitionData {
        match &mut self.body {
            Body::Definition(data) => data,
            Body::Scope(_) => panic!("node is not a definition"),
        }
    }

    /// Diagnostic suffix naming where this node was declared.
    pub(crate) fn where_str(&self) -> String {
        match &self.body {
            Body::Definition(data) if !data.words.is_empty() => data.words[0].where_str(),
            _ => self
                .name_word
                .as_ref()
                .map(Word::where_str)
                .unwrap_or_default(),
        }
    }
}

/// The arena session: owns every node of every tree it has parsed or
/// built, plus the converter registry, the expression caches, and the
/// host symbol resolver.
///
/// # Examples
///
/// ```
/// use philtre::Session;
///
/// let mut session = Session::new();
/// let root = session.parse("x = 1\nsub { y = 2 }", None).unwrap();
/// assert_eq!(session.children(root).len(), 2);
/// ```
pub struct Session {
    pub(crate) nodes: Vec<Node>,
    pub(crate) next_primary_id: u64,
    pub(crate) registry: ConverterRegistry,
    pub(crate) converter_cache: HashMap<String, Rc<dyn Converter>>,
    pub(crate) call_cache: HashMap<String, Rc<CallProxy>>,
    pub(crate) resolver: Rc<dyn SymbolResolver>,
    pub(crate) warnings: Vec<String>,
}

impl Session {
    /// Creates a session with the built-in converter families.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(ConverterRegistry::with_builtins())
    }

    /// Creates a session with an explicit converter registry.
    #[must_use]
    pub fn with_registry(registry: ConverterRegistry) -> Self {
        Self {
            nodes: Vec::new(),
            next_primary_id: 0,
            registry,
            converter_cache: HashMap::new(),
            call_cache: HashMap::new(),
            resolver: Rc::new(NullResolver),
            warnings: Vec::new(),
        }
    }

    /// Installs the host symbol resolver consulted for unknown type
    /// families, `.call=` targets, and `include scope` directives.
    pub fn set_resolver(&mut self, resolver: Rc<dyn SymbolResolver>) {
        self.resolver = resolver;
    }

    /// Registers an additional converter family.
    pub fn register_converter(&mut self, factory: Rc<dyn ConverterFactory>) {
        self.registry.register(factory);
    }

    /// Drops the expression-keyed converter and call-proxy caches.
    pub fn clear_caches(&mut self) {
        self.converter_cache.clear();
        self.call_cache.clear();
    }

    /// Drains accumulated warnings (deprecated parameters that changed
    /// value during a fetch). Warnings are also emitted through `log`.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    // -- node access --------------------------------------------------------

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn push_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_primary_id;
        self.next_primary_id += 1;
        id
    }

    /// The node's declared name (empty for a parse root).
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.node(id).name
    }

    /// True when the node is a scope.
    #[must_use]
    pub fn is_scope(&self, id: NodeId) -> bool {
        self.node(id).is_scope()
    }

    /// True when the node is disabled (`!` prefix).
    #[must_use]
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.node(id).is_disabled
    }

    /// Child ids of a scope, in declaration order. Empty for definitions.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).body {
            Body::Scope(data) => &data.children,
            Body::Definition(_) => &[],
        }
    }

    /// Value words of a definition. `None` for scopes.
    #[must_use]
    pub fn words(&self, id: NodeId) -> Option<&[Word]> {
        match &self.node(id).body {
            Body::Definition(data) => Some(&data.words),
            Body::Scope(_) => None,
        }
    }

    /// The dotted path from the outermost named ancestor down to `id`.
    #[must_use]
    pub fn full_path(&self, id: NodeId) -> String {
        let mut components = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            let node = self.node(c);
            if !node.name.is_empty() {
                components.push(node.name.as_str());
            }
            current = node.parent;
        }
        components.reverse();
        components.join(".")
    }

    /// Like [`full_path`](Self::full_path), but substituting the nearest
    /// `.alias=` on the way up. `None` when no ancestor carries an alias.
    #[must_use]
    pub fn alias_path(&self, id: NodeId) -> Option<String> {
        let node = self.node(id);
        if let Some(alias) = &node.attrs.alias {
            return Some(alias.clone());
        }
        let parent = node.parent?;
        let prefix = self.alias_path(parent)?;
        if node.name.is_empty() {
            Some(prefix)
        } else if prefix.is_empty() {
            Some(node.name.clone())
        } else {
            Some(format!("{prefix}.{}", node.name))
        }
    }

    /// A read-only definition view handed to converters.
    #[must_use]
    pub fn definition_view(&self, id: NodeId) -> DefinitionView<'_> {
        DefinitionView { session: self, id }
    }

    // -- construction -------------------------------------------------------

    /// Creates an empty unnamed root scope.
    pub fn new_root(&mut self) -> NodeId {
        let primary_id = self.next_id();
        self.push_node(Node {
            name: String::new(),
            name_word: None,
            parent: None,
            primary_id,
            is_disabled: false,
            is_template: 0,
            merge_names: false,
            attrs: CommonAttributes::default(),
            body: Body::Scope(ScopeData::empty()),
        })
    }

    /// Creates a named scope node, not yet attached anywhere.
    pub(crate) fn new_scope(&mut self, name: &str, name_word: Option<Word>) -> Result<NodeId> {
        check_name(name, name_word.as_ref())?;
        let primary_id = self.next_id();
        Ok(self.push_node(Node {
            name: name.to_string(),
            name_word,
            parent: None,
            primary_id,
            is_disabled: false,
            is_template: 0,
            merge_names: false,
            attrs: CommonAttributes::default(),
            body: Body::Scope(ScopeData::empty()),
        }))
    }

    /// Creates a definition node, not yet attached anywhere. `words` must
    /// be non-empty.
    pub(crate) fn new_definition(
        &mut self,
        name: &str,
        name_word: Option<Word>,
        words: Vec<Word>,
    ) -> Result<NodeId> {
        check_name(name, name_word.as_ref())?;
        let primary_id = self.next_id();
        Ok(self.push_node(Node {
            name: name.to_string(),
            name_word,
            parent: None,
            primary_id,
            is_disabled: false,
            is_template: 0,
            merge_names: false,
            attrs: CommonAttributes::default(),
            body: Body::Definition(DefinitionData {
                words,
                type_spec: None,
                input_size: None,
                is_include: false,
            }),
        }))
    }

    /// Creates an unprocessed `include` directive node.
    pub(crate) fn new_include(&mut self, name_word: Word, words: Vec<Word>) -> NodeId {
        let primary_id = self.next_id();
        self.push_node(Node {
            name: "include".to_string(),
            name_word: Some(name_word),
            parent: None,
            primary_id,
            is_disabled: false,
            is_template: 0,
            merge_names: false,
            attrs: CommonAttributes::default(),
            body: Body::Definition(DefinitionData {
                words,
                type_spec: None,
                input_size: None,
                is_include: true,
            }),
        })
    }

    // -- structural operations ----------------------------------------------

    /// Attaches `child` under `parent`, splitting a dotted child name into
    /// intermediate scopes. The intermediates of `a.b.c` display merged
    /// (`a.b.c = ...`) when printed.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) {
        let name = self.node(child).name.clone();
        let components: Vec<&str> = name.split('.').collect();
        let mut attach_to = parent;
        let mut merge = false;
        if components.len() > 1 {
            let name_word = self.node(child).name_word.clone();
            for component in &components[..components.len() - 1] {
                let primary_id = self.next_id();
                let scope_id = self.push_node(Node {
                    name: (*component).to_string(),
                    name_word: name_word.clone(),
                    parent: Some(attach_to),
                    primary_id,
                    is_disabled: false,
                    is_template: 0,
                    merge_names: merge,
                    attrs: CommonAttributes::default(),
                    body: Body::Scope(ScopeData::empty()),
                });
                self.node_mut(attach_to).scope_mut().children.push(scope_id);
                attach_to = scope_id;
                merge = true;
            }
            let leaf = self.node_mut(child);
            leaf.name = components[components.len() - 1].to_string();
            leaf.merge_names = true;
        }
        self.node_mut(child).parent = Some(attach_to);
        self.node_mut(attach_to).scope_mut().children.push(child);
    }

    /// Attaches an already-named child without dotted-name splitting.
    pub(crate) fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).scope_mut().children.push(child);
    }

    /// Splices every child of `other` into `parent` (the scopes themselves
    /// are not merged by name; that happens at fetch time).
    pub fn adopt_scope(&mut self, parent: NodeId, other: NodeId) {
        let children = self.node(other).scope().children.clone();
        for child in children {
            self.adopt(parent, child);
        }
    }

    /// True when the scope has no children.
    #[must_use]
    pub fn is_empty(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// Child ids that take part in semantic operations: not disabled, in
    /// declaration order.
    pub(crate) fn active_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| !self.node(c).is_disabled)
            .collect()
    }

    /// All active definitions below `root`, as `(dotted path, id)` pairs
    /// in declaration order. Template copies marked `-1` are skipped;
    /// `suppress_multiple` additionally skips subtrees flagged
    /// `.multiple=True`.
    #[must_use]
    pub fn all_definitions(&self, root: NodeId, suppress_multiple: bool) -> Vec<(String, NodeId)> {
        let mut result = Vec::new();
        self.collect_definitions(root, "", suppress_multiple, &mut result);
        result
    }

    fn collect_definitions(
        &self,
        id: NodeId,
        prefix: &str,
        suppress_multiple: bool,
        result: &mut Vec<(String, NodeId)>,
    ) {
        for &child in self.children(id) {
            let node = self.node(child);
            if node.is_disabled || node.is_template < 0 {
                continue;
            }
            if suppress_multiple && node.attrs.multiple == Some(true) {
                continue;
            }
            let path = if prefix.is_empty() {
                node.name.clone()
            } else {
                format!("{prefix}.{}", node.name)
            };
            if node.is_scope() {
                self.collect_definitions(child, &path, suppress_multiple, result);
            } else if !node.definition().is_include {
                result.push((path, child));
            }
        }
    }

    /// Resolves a dotted path against a scope without variable
    /// substitution, returning every match in declaration order
    /// (duplicate sibling scopes all contribute).
    #[must_use]
    pub fn get_without_substitution(&self, root: NodeId, path: &str) -> Vec<NodeId> {
        let mut matches = vec![root];
        for component in path.split('.') {
            let mut next = Vec::new();
            for m in matches {
                if !self.node(m).is_scope() {
                    continue;
                }
                for &child in self.children(m) {
                    let node = self.node(child);
                    if !node.is_disabled && node.name == component {
                        next.push(child);
                    }
                }
            }
            matches = next;
            if matches.is_empty() {
                break;
            }
        }
        matches
    }

    // -- copies -------------------------------------------------------------

    /// Shallow copy: a new node sharing the child id list (for scopes) or
    /// the word list (for definitions).
    pub(crate) fn shallow_copy(&mut self, id: NodeId) -> NodeId {
        let node = self.node(id).clone();
        self.push_node(node)
    }

    /// Shallow copy of a scope with a replaced child list.
    pub(crate) fn customized_copy(&mut self, id: NodeId, children: Vec<NodeId>) -> NodeId {
        let mut node = self.node(id).clone();
        node.scope_mut().children = children;
        self.push_node(node)
    }

    /// Shallow copy of a definition with replaced value words.
    pub(crate) fn copy_with_words(&mut self, id: NodeId, words: Vec<Word>) -> NodeId {
        let mut node = self.node(id).clone();
        node.definition_mut().words = words;
        self.push_node(node)
    }

    /// Deep copy of a subtree with all parent links rewritten, so the copy
    /// is lexically anchored under `new_parent` instead of wherever the
    /// original was declared.
    pub(crate) fn deep_copy_reparented(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
    ) -> NodeId {
        let mut node = self.node(id).clone();
        node.parent = new_parent;
        let copy = self.push_node(node);
        if self.node(copy).is_scope() {
            let children = self.node(copy).scope().children.clone();
            let new_children: Vec<NodeId> = children
                .into_iter()
                .map(|c| self.deep_copy_reparented(c, Some(copy)))
                .collect();
            self.node_mut(copy).scope_mut().children = new_children;
        }
        copy
    }

    /// Collapses duplicate names: for each name the last occurrence wins,
    /// recursively. Returns a new scope node.
    pub fn unique(&mut self, id: NodeId) -> NodeId {
        let children = self.node(id).scope().children.clone();
        let mut last_index: HashMap<String, usize> = HashMap::new();
        for (i, &child) in children.iter().enumerate() {
            last_index.insert(self.node(child).name.clone(), i);
        }
        let mut kept = Vec::new();
        for (i, &child) in children.iter().enumerate() {
            if last_index.get(&self.node(child).name) == Some(&i) {
                let kept_child = if self.node(child).is_scope() {
                    self.unique(child)
                } else {
                    child
                };
                kept.push(kept_child);
            }
        }
        let copy = self.customized_copy(id, kept);
        for &child in &self.node(copy).scope().children.clone() {
            self.node_mut(child).parent = Some(copy);
        }
        copy
    }

    // -- attribute assignment -----------------------------------------------

    /// Assigns a `.attribute = value` binding parsed after a definition or
    /// scope, validating name and value.
    pub(crate) fn assign_attribute(
        &mut self,
        id: NodeId,
        attribute: &str,
        words: &[Word],
    ) -> Result<()> {
        let location = words
            .first()
            .map(Word::where_str)
            .unwrap_or_default();
        let schema_error = |message: String| Error::Schema {
            message,
            location: location.clone(),
        };
        let is_scope = self.node(id).is_scope();
        match attribute {
            "help" | "caption" | "short_caption" | "style" => {
                let value = attr_str(words);
                let attrs = &mut self.node_mut(id).attrs;
                match attribute {
                    "help" => attrs.help = value,
                    "caption" => attrs.caption = value,
                    "short_caption" => attrs.short_caption = value,
                    _ => attrs.style = value,
                }
            }
            "optional" | "multiple" => {
                let value = attr_bool(words).map_err(&schema_error)?;
                let attrs = &mut self.node_mut(id).attrs;
                if attribute == "optional" {
                    attrs.optional = value;
                } else {
                    attrs.multiple = value;
                }
            }
            "expert_level" => {
                self.node_mut(id).attrs.expert_level =
                    attr_int(words).map_err(&schema_error)?;
            }
            "deprecated" => {
                self.node_mut(id).attrs.deprecated =
                    attr_bool(words).map_err(&schema_error)?.unwrap_or(false);
            }
            "alias" => {
                let value = attr_str(words);
                if let Some(alias) = &value {
                    if !is_standard_identifier(alias) {
                        return Err(schema_error(format!(
                            "invalid alias \"{alias}\""
                        )));
                    }
                }
                self.node_mut(id).attrs.alias = value;
            }
            "type" if !is_scope => {
                let resolver = Rc::clone(&self.resolver);
                let spec = TypeResolution::resolve_type(
                    words,
                    &self.registry,
                    &mut self.converter_cache,
                    resolver.as_ref(),
                )?;
                self.node_mut(id).definition_mut().type_spec = spec;
            }
            "input_size" if !is_scope => {
                self.node_mut(id).definition_mut().input_size =
                    attr_int(words).map_err(&schema_error)?;
            }
            "call" if is_scope => {
                let full_path = self.full_path(id);
                let resolver = Rc::clone(&self.resolver);
                let spec = TypeResolution::resolve_call(
                    &full_path,
                    words,
                    &mut self.call_cache,
                    resolver.as_ref(),
                )?;
                self.node_mut(id).scope_mut().call = spec;
            }
            "sequential_format" if is_scope => {
                let value = attr_str(words);
                if let Some(format) = &value {
                    check_sequential_format(format).map_err(&schema_error)?;
                }
                self.node_mut(id).scope_mut().sequential_format = value;
            }
            "disable_add" | "disable_delete" if is_scope => {
                let value = attr_bool(words).map_err(&schema_error)?;
                let scope = self.node_mut(id).scope_mut();
                if attribute == "disable_add" {
                    scope.disable_add = value;
                } else {
                    scope.disable_delete = value;
                }
            }
            _ => {
                return Err(schema_error(format!(
                    "unexpected {} attribute: .{attribute}",
                    self.node(id).kind()
                )));
            }
        }
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a definition, the context handed to converters.
pub struct DefinitionView<'a> {
    pub(crate) session: &'a Session,
    pub(crate) id: NodeId,
}

impl DefinitionView<'_> {
    /// The definition's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.session.name(self.id)
    }

    /// The dotted path of the definition.
    #[must_use]
    pub fn full_path(&self) -> String {
        self.session.full_path(self.id)
    }

    /// The declared value words.
    #[must_use]
    pub fn words(&self) -> &[Word] {
        &self.session.node(self.id).definition().words
    }

    /// The `.optional=` attribute.
    #[must_use]
    pub fn optional(&self) -> Option<bool> {
        self.session.node(self.id).attrs.optional
    }

    /// The `.multiple=` attribute.
    #[must_use]
    pub fn multiple(&self) -> Option<bool> {
        self.session.node(self.id).attrs.multiple
    }

    /// Diagnostic suffix naming where the definition was declared.
    #[must_use]
    pub fn where_str(&self) -> String {
        self.session.node(self.id).where_str()
    }
}

/// Validates a definition or scope name: a standard (possibly dotted)
/// identifier, no reserved dunder components, and `include` only as the
/// whole undotted name.
fn check_name(name: &str, name_word: Option<&Word>) -> Result<()> {
    let location = name_word.map(Word::where_str).unwrap_or_default();
    let schema_error = |message: String| {
        Err(Error::Schema {
            message,
            location: location.clone(),
        })
    };
    if !is_standard_identifier(name) {
        return schema_error(format!("invalid name: \"{name}\""));
    }
    for component in name.split('.') {
        if is_reserved_identifier(component) {
            return schema_error(format!("reserved identifier: \"{component}\""));
        }
        if component == "include" && name != "include" {
            return schema_error(format!(
                "\"include\" not allowed as a path component: \"{name}\""
            ));
        }
    }
    Ok(())
}

fn attr_str(words: &[Word]) -> Option<String> {
    if is_plain_none(words) {
        None
    } else {
        Some(join_word_values(words))
    }
}

fn attr_bool(words: &[Word]) -> std::result::Result<Option<bool>, String> {
    if is_plain_none(words) || is_plain_auto(words) {
        return Ok(None);
    }
    let text = join_word_values(words);
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Some(true)),
        "false" | "no" | "off" | "0" => Ok(Some(false)),
        _ => Err(format!("one True or False value expected, \"{text}\" found")),
    }
}

fn attr_int(words: &[Word]) -> std::result::Result<Option<i64>, String> {
    if is_plain_none(words) || is_plain_auto(words) {
        return Ok(None);
    }
    let text = join_word_values(words);
    text.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| format!("integer expected, \"{text}\" found"))
}

/// A sequential format must contain exactly one `%` directive and it must
/// format an integer (e.g. `run_%03d`).
fn check_sequential_format(format: &str) -> std::result::Result<(), String> {
    let mut directives = 0usize;
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            continue;
        }
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
        }
        match chars.next() {
            Some('d') => directives += 1,
            _ => {
                return Err(format!(
                    "sequential_format must use an integer directive: \"{format}\""
                ))
            }
        }
    }
    if directives == 1 {
        Ok(())
    } else {
        Err(format!(
            "sequential_format must contain exactly one integer directive: \"{format}\""
        ))
    }
}

/// Synthesizes the placeholder value word for an empty definition value.
pub(crate) fn none_word(line: Option<usize>, source: Option<std::rc::Rc<str>>) -> Word {
    match line {
        Some(line) => Word::with_location("None", Quote::None, line, source),
        None => Word::new("None"),
    }
}
