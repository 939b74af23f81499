//! Host-supplied symbol resolution.
//!
//! Three language features reference names the library cannot know about:
//! unknown `.type=` families, `.call=` targets, and `include scope`
//! directives. A [`SymbolResolver`] supplied by the embedding application
//! answers those lookups; the default [`NullResolver`] answers none, so
//! unresolved symbols surface as the corresponding type or include errors.

use std::rc::Rc;

use crate::tree::NodeId;
use crate::types::{CallArgs, Converter, ScopeCall};

/// What an `include scope` directive resolves to.
pub enum IncludeTarget {
    /// Raw source text to parse and splice in.
    Text(String),
    /// An existing scope in the same session.
    Node(NodeId),
    /// A generator producing source text on demand.
    Generate(Box<dyn Fn() -> String>),
}

/// Resolves symbols the language defers to the host.
///
/// Every method has a resolve-nothing default, so implementations only
/// override the lookups they support.
pub trait SymbolResolver {
    /// Builds a converter for a type family the built-in registry does not
    /// know. `Some(Err(message))` reports a construction failure;
    /// `None` means the family is unknown here too.
    fn converter(
        &self,
        phil_type: &str,
        args: &CallArgs,
    ) -> Option<std::result::Result<Rc<dyn Converter>, String>> {
        let _ = (phil_type, args);
        None
    }

    /// Resolves a `.call=` target to a callable.
    fn call_target(&self, path: &str) -> Option<Rc<dyn ScopeCall>> {
        let _ = path;
        None
    }

    /// Resolves an `include scope` target path.
    fn include_scope(&self, path: &str) -> Option<IncludeTarget> {
        let _ = path;
        None
    }
}

/// The default resolver: resolves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl SymbolResolver for NullResolver {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_resolver_resolves_nothing() {
        let resolver = NullResolver;
        assert!(resolver.converter("mystery", &CallArgs::default()).is_none());
        assert!(resolver.call_target("pkg.run").is_none());
        assert!(resolver.include_scope("pkg.defaults").is_none());
    }
}
