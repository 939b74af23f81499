//! Expansion of `include file` and `include scope` directives.
//!
//! File includes reparse the named file relative to the including file's
//! directory and splice its children in place. Scope includes ask the
//! session's [`SymbolResolver`](crate::symbols::SymbolResolver) for a
//! target, which may be literal text, a generator, or an existing tree,
//! and copy it under the including node's parent, optionally narrowed to
//! a dotted sub-path. A stack of canonical file paths catches cycles.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::symbols::IncludeTarget;
use crate::token::Word;
use crate::tree::{NodeId, Session};

impl Session {
    /// Expands every `include` directive below `root`, returning the
    /// same root with directives replaced by their content.
    ///
    /// `reference_dir` anchors relative file paths; when `None`, the
    /// process working directory applies.
    ///
    /// # Errors
    ///
    /// Unreadable or unparsable included files, include cycles,
    /// unresolvable scope targets, and narrowing paths that match
    /// nothing.
    pub fn process_includes(
        &mut self,
        root: NodeId,
        reference_dir: Option<&Path>,
    ) -> Result<NodeId> {
        let mut open_files = Vec::new();
        self.expand_includes(root, reference_dir, &mut open_files)?;
        Ok(root)
    }

    fn expand_includes(
        &mut self,
        scope: NodeId,
        reference_dir: Option<&Path>,
        open_files: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let children = self.children(scope).to_vec();
        let mut expanded = Vec::with_capacity(children.len());
        for child in children {
            let node = self.node(child);
            if node.is_scope() {
                expanded.push(child);
                self.expand_includes(child, reference_dir, open_files)?;
                continue;
            }
            if !node.definition().is_include || node.is_disabled {
                expanded.push(child);
                continue;
            }
            let words = node.definition().words.clone();
            match words[0].value() {
                "file" => {
                    self.include_file(scope, &words, reference_dir, open_files, &mut expanded)?;
                }
                "scope" => {
                    self.include_scope(scope, &words, open_files, &mut expanded)?;
                }
                other => {
                    return Err(include_error(
                        format!("unknown include kind \"{other}\""),
                        &words[0],
                    ));
                }
            }
        }
        self.node_mut(scope).scope_mut().children = expanded;
        Ok(())
    }

    fn include_file(
        &mut self,
        _scope: NodeId,
        words: &[Word],
        reference_dir: Option<&Path>,
        open_files: &mut Vec<PathBuf>,
        expanded: &mut Vec<NodeId>,
    ) -> Result<()> {
        if words.len() != 2 {
            return Err(include_error(
                "\"include file\" takes exactly one path".to_string(),
                &words[0],
            ));
        }
        let mut path = PathBuf::from(words[1].value());
        if path.is_relative() {
            if let Some(dir) = reference_dir {
                path = dir.join(path);
            }
        }
        let canonical = path.canonicalize().map_err(|error| {
            include_error(
                format!("error reading \"{}\": {error}", path.display()),
                &words[1],
            )
        })?;
        if open_files.contains(&canonical) {
            let mut chain = open_files.clone();
            chain.push(canonical);
            return Err(Error::IncludeCycle { chain });
        }
        let input = std::fs::read_to_string(&canonical)?;
        let source = format!("file \"{}\"", path.display());
        let included = self.parse(&input, Some(&source))?;
        open_files.push(canonical.clone());
        let result = self.expand_includes(included, canonical.parent(), open_files);
        open_files.pop();
        result?;
        // spliced in place; the nodes keep the included root as parent so
        // substitution inside the file stays local to it
        expanded.extend_from_slice(self.children(included));
        Ok(())
    }

    fn include_scope(
        &mut self,
        scope: NodeId,
        words: &[Word],
        open_files: &mut Vec<PathBuf>,
        expanded: &mut Vec<NodeId>,
    ) -> Result<()> {
        if words.len() < 2 || words.len() > 3 {
            return Err(include_error(
                "\"include scope\" takes a target and an optional sub-path".to_string(),
                &words[0],
            ));
        }
        let target_path = words[1].value().to_string();
        let resolver = Rc::clone(&self.resolver);
        let target = resolver.include_scope(&target_path).ok_or_else(|| {
            include_error(format!("undefined scope \"{target_path}\""), &words[1])
        })?;
        let included = match target {
            IncludeTarget::Node(id) => id,
            IncludeTarget::Text(text) => {
                let source = format!("include scope \"{target_path}\"");
                self.parse(&text, Some(&source))?
            }
            IncludeTarget::Generate(generate) => {
                let source = format!("include scope \"{target_path}\"");
                self.parse(&generate(), Some(&source))?
            }
        };
        self.expand_includes(included, None, open_files)?;
        let picked = if words.len() == 3 {
            let narrow = words[2].value().to_string();
            let matches = self.get(included, &narrow)?;
            if matches.is_empty() {
                return Err(include_error(
                    format!("scope \"{target_path}\" has no object \"{narrow}\""),
                    &words[2],
                ));
            }
            matches
        } else {
            self.children(included).to_vec()
        };
        for id in picked {
            let copy = self.deep_copy_reparented(id, Some(scope));
            expanded.push(copy);
        }
        Ok(())
    }
}

fn include_error(message: String, anchor: &Word) -> Error {
    Error::Include {
        message,
        location: anchor.where_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolResolver;
    use crate::tree::show::ShowOptions;
    use std::fs;

    fn show(session: &Session, root: NodeId) -> String {
        session.as_str(root, &ShowOptions::default())
    }

    #[test]
    fn test_include_file_splices_children() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.phil"), "a = 1\nb = 2\n").unwrap();
        fs::write(
            dir.path().join("main.phil"),
            "include file base.phil\nc = 3\n",
        )
        .unwrap();
        let mut session = Session::new();
        let root = session
            .parse_file(&dir.path().join("main.phil"), true)
            .unwrap();
        assert_eq!(show(&session, root), "a = 1\nb = 2\nc = 3\n");
    }

    #[test]
    fn test_include_file_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/inner.phil"), "x = 1\n").unwrap();
        fs::write(
            dir.path().join("sub/mid.phil"),
            "include file inner.phil\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("main.phil"),
            "include file sub/mid.phil\n",
        )
        .unwrap();
        let mut session = Session::new();
        let root = session
            .parse_file(&dir.path().join("main.phil"), true)
            .unwrap();
        assert_eq!(show(&session, root), "x = 1\n");
    }

    #[test]
    fn test_include_inside_scope() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.phil"), "a = 1\n").unwrap();
        fs::write(
            dir.path().join("main.phil"),
            "s {\n  include file base.phil\n}\n",
        )
        .unwrap();
        let mut session = Session::new();
        let root = session
            .parse_file(&dir.path().join("main.phil"), true)
            .unwrap();
        assert_eq!(show(&session, root), "s {\n  a = 1\n}\n");
    }

    #[test]
    fn test_include_cycle_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.phil"), "include file b.phil\n").unwrap();
        fs::write(dir.path().join("b.phil"), "include file a.phil\n").unwrap();
        let mut session = Session::new();
        let err = session
            .parse_file(&dir.path().join("a.phil"), true)
            .unwrap_err();
        assert!(err.is_include_cycle());
        let display = format!("{err}");
        assert!(display.contains("a.phil"));
        assert!(display.contains("b.phil"));
    }

    #[test]
    fn test_include_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.phil"),
            "include file nowhere.phil\n",
        )
        .unwrap();
        let mut session = Session::new();
        let err = session
            .parse_file(&dir.path().join("main.phil"), true)
            .unwrap_err();
        assert!(format!("{err}").contains("nowhere.phil"));
    }

    #[test]
    fn test_disabled_include_is_kept_unexpanded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.phil"),
            "!include file nowhere.phil\nx = 1\n",
        )
        .unwrap();
        let mut session = Session::new();
        let root = session
            .parse_file(&dir.path().join("main.phil"), true)
            .unwrap();
        assert_eq!(show(&session, root), "!include file nowhere.phil\nx = 1\n");
    }

    struct LibraryResolver;

    impl SymbolResolver for LibraryResolver {
        fn include_scope(&self, path: &str) -> Option<IncludeTarget> {
            match path {
                "library.defaults" => {
                    Some(IncludeTarget::Text("d = 4\ns {\n  e = 5\n}".to_string()))
                }
                "library.generated" => Some(IncludeTarget::Generate(Box::new(|| {
                    "g = 6".to_string()
                }))),
                _ => None,
            }
        }
    }

    #[test]
    fn test_include_scope_from_text() {
        let mut session = Session::new();
        session.set_resolver(Rc::new(LibraryResolver));
        let root = session
            .parse("include scope library.defaults\nz = 9", None)
            .unwrap();
        let root = session.process_includes(root, None).unwrap();
        assert_eq!(show(&session, root), "d = 4\ns {\n  e = 5\n}\nz = 9\n");
    }

    #[test]
    fn test_include_scope_narrowed() {
        let mut session = Session::new();
        session.set_resolver(Rc::new(LibraryResolver));
        let root = session
            .parse("include scope library.defaults s.e", None)
            .unwrap();
        let root = session.process_includes(root, None).unwrap();
        assert_eq!(show(&session, root), "e = 5\n");
    }

    #[test]
    fn test_include_scope_narrowing_miss_is_fatal() {
        let mut session = Session::new();
        session.set_resolver(Rc::new(LibraryResolver));
        let root = session
            .parse("include scope library.defaults s.missing", None)
            .unwrap();
        let err = session.process_includes(root, None).unwrap_err();
        assert!(format!("{err}").contains("s.missing"));
    }

    #[test]
    fn test_include_scope_generated() {
        let mut session = Session::new();
        session.set_resolver(Rc::new(LibraryResolver));
        let root = session
            .parse("include scope library.generated", None)
            .unwrap();
        let root = session.process_includes(root, None).unwrap();
        assert_eq!(show(&session, root), "g = 6\n");
    }

    #[test]
    fn test_include_scope_from_existing_tree() {
        struct TreeResolver {
            tree: NodeId,
        }
        impl SymbolResolver for TreeResolver {
            fn include_scope(&self, path: &str) -> Option<IncludeTarget> {
                (path == "shared").then(|| IncludeTarget::Node(self.tree))
            }
        }
        let mut session = Session::new();
        let tree = session.parse("k = 7", None).unwrap();
        session.set_resolver(Rc::new(TreeResolver { tree }));
        let root = session.parse("include scope shared", None).unwrap();
        let root = session.process_includes(root, None).unwrap();
        assert_eq!(show(&session, root), "k = 7\n");
    }

    #[test]
    fn test_unresolved_include_scope() {
        let mut session = Session::new();
        let root = session.parse("include scope no.such.thing", None).unwrap();
        let err = session.process_includes(root, None).unwrap_err();
        assert!(format!("{err}").contains("no.such.thing"));
    }
}
