//! The fetch engine: merging user inputs onto a master schema.
//!
//! Fetching walks the master tree and, for every object, looks up the
//! matching objects in the combined sources. Definitions take the last
//! matching source value (every match is visited, so usage tracking sees
//! them all); scopes recurse; `.multiple=True` objects collect every
//! distinct occurrence, deduplicated by canonical form, behind a fresh
//! template node. The result is always shaped exactly like the master.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::token::Word;
use crate::tree::{NodeId, Session};
use crate::types::TypeSpec;

/// Options controlling a [`Session::fetch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    /// Produce a minimal diff: only values that differ from the master
    /// defaults are kept and empty scopes are pruned.
    pub diff: bool,
    /// Tolerate scope/definition mismatches between master and source
    /// instead of failing.
    pub skip_incompatible_objects: bool,
    /// Record which source definitions never matched anything.
    pub track_unused_definitions: bool,
}

/// Identifies a source definition for unused-input reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocator {
    /// The dotted path of the definition.
    pub path: String,
    /// Where it was declared, possibly empty.
    pub where_str: String,
}

impl fmt::Display for ObjectLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.path, self.where_str)
    }
}

/// The outcome of a fetch: the merged tree plus, when requested, the
/// source definitions that never matched the master.
#[derive(Debug)]
pub struct Fetched {
    /// Root of the merged (or diffed) tree.
    pub root: NodeId,
    /// Unmatched source definitions, in arena order.
    pub unused: Vec<ObjectLocator>,
}

/// Usage bookkeeping for `track_unused_definitions`. Only seeded nodes
/// are tracked; marking anything else is a no-op.
#[derive(Default)]
pub(crate) struct UsageMarks {
    marks: HashMap<NodeId, bool>,
}

impl UsageMarks {
    fn seed(&mut self, id: NodeId) {
        self.marks.entry(id).or_insert(false);
    }

    pub(crate) fn mark(&mut self, id: NodeId) {
        if let Some(used) = self.marks.get_mut(&id) {
            *used = true;
        }
    }

    fn unused_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .marks
            .iter()
            .filter(|(_, used)| !**used)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_by_key(|id| id.0);
        ids
    }
}

fn words_display(words: &[Word]) -> String {
    words
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Session {
    /// Merges `sources` onto `master`, returning a tree shaped like the
    /// master with source values substituted.
    ///
    /// # Errors
    ///
    /// Incompatible master/source objects, substitution failures, and
    /// conversion failures inside `.multiple=` deduplication.
    ///
    /// # Examples
    ///
    /// ```
    /// use philtre::{FetchOptions, Session, ShowOptions};
    ///
    /// let mut session = Session::new();
    /// let master = session.parse("a { b = 1\n  c = 2\n}", None).unwrap();
    /// let user = session.parse("a.b = 5", None).unwrap();
    /// let fetched = session
    ///     .fetch(master, &[user], &FetchOptions::default())
    ///     .unwrap();
    /// assert_eq!(
    ///     session.as_str(fetched.root, &ShowOptions::default()),
    ///     "a {\n  b = 5\n  c = 2\n}\n"
    /// );
    /// ```
    pub fn fetch(
        &mut self,
        master: NodeId,
        sources: &[NodeId],
        options: &FetchOptions,
    ) -> Result<Fetched> {
        let mut children = Vec::new();
        for &source in sources {
            children.extend_from_slice(self.children(source));
        }
        let combined = self.new_root();
        self.node_mut(combined).scope_mut().children = children;
        let mut marks = UsageMarks::default();
        if options.track_unused_definitions {
            self.seed_marks(combined, &mut marks);
        }
        let root = self.fetch_scope(master, combined, options, &mut marks)?;
        let unused = marks
            .unused_ids()
            .into_iter()
            .map(|id| ObjectLocator {
                path: self.full_path(id),
                where_str: self.node(id).where_str(),
            })
            .collect();
        Ok(Fetched { root, unused })
    }

    /// Merges and keeps only what differs from the master defaults.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    pub fn fetch_diff(&mut self, master: NodeId, sources: &[NodeId]) -> Result<NodeId> {
        let options = FetchOptions {
            diff: true,
            ..FetchOptions::default()
        };
        Ok(self.fetch(master, sources, &options)?.root)
    }

    fn seed_marks(&self, scope: NodeId, marks: &mut UsageMarks) {
        for &child in self.children(scope) {
            let node = self.node(child);
            if node.is_disabled || node.is_template != 0 {
                continue;
            }
            if node.is_scope() {
                self.seed_marks(child, marks);
            } else if !node.definition().is_include {
                marks.seed(child);
            }
        }
    }

    /// Master children taking part in a fetch, with duplicate-name
    /// handling: duplicate non-multiple definitions are a schema error,
    /// later copies of a multiple object collapse into its first
    /// occurrence, duplicate non-multiple scopes all participate.
    fn master_active_objects(&self, master: NodeId) -> Result<Vec<NodeId>> {
        let mut first_seen: HashMap<String, NodeId> = HashMap::new();
        let mut result = Vec::new();
        for &child in self.children(master) {
            let node = self.node(child);
            if node.is_disabled {
                continue;
            }
            if node.is_definition() && node.definition().is_include {
                continue;
            }
            if let Some(&first) = first_seen.get(&node.name) {
                if self.node(first).attrs.multiple == Some(true) {
                    continue;
                }
                if node.is_definition() || self.node(first).is_definition() {
                    return Err(Error::Schema {
                        message: format!(
                            "duplicate definition in master: \"{}\"",
                            self.full_path(child)
                        ),
                        location: node.where_str(),
                    });
                }
                result.push(child);
            } else {
                first_seen.insert(node.name.clone(), child);
                result.push(child);
            }
        }
        Ok(result)
    }

    /// Active source children matching a master object by name or by its
    /// `.alias=`; template artifacts from earlier fetches never act as
    /// sources.
    fn source_matches(&self, source: NodeId, master_object: NodeId) -> Vec<NodeId> {
        let master_node = self.node(master_object);
        let name = master_node.name.as_str();
        let alias = master_node.attrs.alias.as_deref();
        self.children(source)
            .iter()
            .copied()
            .filter(|&child| {
                let node = self.node(child);
                !node.is_disabled
                    && node.is_template == 0
                    && (node.name == name || Some(node.name.as_str()) == alias)
            })
            .collect()
    }

    fn incompatible_error(&self, master: NodeId, source: NodeId) -> Error {
        let master_node = self.node(master);
        let source_node = self.node(source);
        Error::Incompatible {
            master_kind: master_node.kind(),
            master: self.full_path(master),
            master_location: master_node.where_str(),
            source_kind: source_node.kind(),
            source_path: self.full_path(source),
            source_location: source_node.where_str(),
        }
    }

    fn fetch_scope(
        &mut self,
        master: NodeId,
        source: NodeId,
        options: &FetchOptions,
        marks: &mut UsageMarks,
    ) -> Result<NodeId> {
        let result = self.customized_copy(master, Vec::new());
        self.node_mut(result).is_template = 0;
        for master_object in self.master_active_objects(master)? {
            let name = self.node(master_object).name.clone();
            let matches = self.source_matches(source, master_object);
            if self.node(master_object).attrs.multiple == Some(true) {
                // same-named master siblings carry declarations split
                // across fragments; they fetch ahead of the sources
                let mut candidates: Vec<(bool, NodeId)> = self
                    .children(master)
                    .iter()
                    .copied()
                    .filter(|&child| {
                        child != master_object && {
                            let node = self.node(child);
                            !node.is_disabled && node.is_template == 0 && node.name == name
                        }
                    })
                    .map(|child| (true, child))
                    .collect();
                candidates.extend(matches.iter().map(|&m| (false, m)));
                self.fetch_multiple(result, master_object, &candidates, options, marks)?;
            } else if self.node(master_object).is_definition() {
                // every match is visited so usage tracking sees them all;
                // the last visible one wins
                let mut result_object = None;
                for &src in &matches {
                    if let Some(fetched) =
                        self.fetch_value(master_object, src, options, marks)?
                    {
                        result_object = Some(fetched);
                    }
                }
                match result_object {
                    Some(fetched) => {
                        if options.diff
                            && self.object_as_str(fetched)
                                == self.object_as_str(master_object)
                        {
                            continue;
                        }
                        self.attach_child(result, fetched);
                    }
                    None => {
                        // deprecated defaults never re-enter the result
                        if !options.diff && !self.node(master_object).attrs.deprecated {
                            let copy = self.shallow_copy(master_object);
                            self.attach_child(result, copy);
                        }
                    }
                }
            } else {
                let mut sub_children = Vec::new();
                for &src in &matches {
                    if !self.node(src).is_scope() {
                        if options.skip_incompatible_objects {
                            continue;
                        }
                        return Err(self.incompatible_error(master_object, src));
                    }
                    sub_children.extend_from_slice(self.children(src));
                }
                let combined = self.new_root();
                self.node_mut(combined).scope_mut().children = sub_children;
                let sub = self.fetch_scope(master_object, combined, options, marks)?;
                if options.diff && self.children(sub).is_empty() {
                    continue;
                }
                self.attach_child(result, sub);
            }
        }
        Ok(result)
    }

    /// The `.multiple=True` branch: realize every distinct occurrence
    /// behind a template node. `candidates` pairs each object with a flag
    /// saying whether it came from the master side.
    fn fetch_multiple(
        &mut self,
        result: NodeId,
        master_object: NodeId,
        candidates: &[(bool, NodeId)],
        options: &FetchOptions,
        marks: &mut UsageMarks,
    ) -> Result<()> {
        let master_canonical = self.canonical_str(master_object)?;
        // canonical form -> index into group; None suppresses the form
        let mut processed: HashMap<String, Option<usize>> = HashMap::new();
        let mut group: Vec<Option<NodeId>> = Vec::new();
        for &(from_master, src) in candidates {
            let fetched = if self.node(master_object).is_definition() {
                match self.fetch_value(master_object, src, options, marks)? {
                    Some(fetched) => fetched,
                    None => continue,
                }
            } else {
                if !self.node(src).is_scope() {
                    if options.skip_incompatible_objects {
                        continue;
                    }
                    return Err(self.incompatible_error(master_object, src));
                }
                let combined = self.new_root();
                let src_children = self.children(src).to_vec();
                self.node_mut(combined).scope_mut().children = src_children;
                let sub = self.fetch_scope(master_object, combined, options, marks)?;
                if options.diff && self.children(sub).is_empty() {
                    continue;
                }
                sub
            };
            let canonical = self.canonical_str(fetched)?;
            if canonical == master_canonical {
                continue;
            }
            match processed.get(&canonical) {
                Some(None) => continue,
                Some(Some(previous)) => group[*previous] = None,
                None => {}
            }
            if options.diff && from_master {
                processed.insert(canonical, None);
            } else {
                processed.insert(canonical, Some(group.len()));
                group.push(Some(fetched));
            }
        }
        if !options.diff {
            let template = self.shallow_copy(master_object);
            let optional = self.node(master_object).attrs.optional;
            self.node_mut(template).is_template = if optional == Some(false) {
                0
            } else if processed.is_empty() {
                1
            } else {
                -1
            };
            self.attach_child(result, template);
        }
        for fetched in group.into_iter().flatten() {
            self.attach_child(result, fetched);
        }
        Ok(())
    }

    /// Fetches one definition value from one source object. `Ok(None)`
    /// means the source contributes nothing (an unchanged deprecated
    /// value, or an incompatible object being skipped at the multiple
    /// level).
    fn fetch_value(
        &mut self,
        master_def: NodeId,
        source: NodeId,
        options: &FetchOptions,
        marks: &mut UsageMarks,
    ) -> Result<Option<NodeId>> {
        if self.node(source).is_scope() {
            if !options.skip_incompatible_objects {
                return Err(self.incompatible_error(master_def, source));
            }
            return Ok(Some(self.shallow_copy(master_def)));
        }
        marks.mark(source);
        let resolved = self.resolve_definition_variables(source, options.diff, marks)?;
        let mut new_words = self.node(resolved).definition().words.clone();
        // the deprecated comparison sees the source's own spelling, before
        // any converter hook renormalizes it
        if self.node(master_def).attrs.deprecated {
            let master_str = words_display(&self.node(master_def).definition().words);
            if words_display(&new_words) == master_str {
                return Ok(None);
            }
            let message = format!(
                "deprecated parameter \"{}\" has been overridden{}",
                self.full_path(master_def),
                self.node(source).where_str()
            );
            log::warn!("{message}");
            self.warnings.push(message);
        }
        if let Some(TypeSpec::Converter { converter, .. }) =
            self.node(master_def).definition().type_spec.clone()
        {
            if let Some(hooked) = converter.fetch(
                &new_words,
                &self.definition_view(master_def),
                options.skip_incompatible_objects,
            ) {
                new_words = hooked?;
            }
        }
        let fetched = self.copy_with_words(master_def, new_words);
        self.node_mut(fetched).is_template = 0;
        Ok(Some(fetched))
    }

    /// Canonical rendering for deduplication: the value goes through its
    /// converter and back, so equivalent spellings compare equal.
    fn canonical_str(&mut self, id: NodeId) -> Result<String> {
        let formatted = if self.node(id).is_scope() {
            let extract = self.extract(id)?;
            self.format(id, &extract)?
        } else {
            let value = self.extract_definition(id)?;
            self.format_definition(id, &value)?
        };
        Ok(self.object_as_str(formatted))
    }
}
