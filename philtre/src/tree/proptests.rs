//! Property-based tests for parsing, printing, and fetching.

use super::show::ShowOptions;
use super::Session;
use crate::fetch::FetchOptions;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum TreeItem {
    Definition { name: String, values: Vec<String> },
    Scope { name: String, items: Vec<TreeItem> },
}

impl TreeItem {
    fn name(&self) -> &str {
        match self {
            TreeItem::Definition { name, .. } | TreeItem::Scope { name, .. } => name,
        }
    }
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,5}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.+-]{1,8}"
}

fn item_strategy() -> impl Strategy<Value = TreeItem> {
    let leaf = (name_strategy(), prop::collection::vec(value_strategy(), 1..3))
        .prop_map(|(name, values)| TreeItem::Definition { name, values });
    leaf.prop_recursive(3, 16, 4, |inner| {
        (name_strategy(), prop::collection::vec(inner, 0..4))
            .prop_map(|(name, items)| TreeItem::Scope { name, items })
    })
}

fn tree_strategy() -> impl Strategy<Value = Vec<TreeItem>> {
    prop::collection::vec(item_strategy(), 0..5)
}

// Renders with sibling names deduplicated so the result is a valid
// fetch master.
fn render(items: &[TreeItem], indent: usize, out: &mut String) {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        if !seen.insert(item.name().to_string()) {
            continue;
        }
        let pad = "  ".repeat(indent);
        match item {
            TreeItem::Definition { name, values } => {
                out.push_str(&format!("{pad}{name} = {}\n", values.join(" ")));
            }
            TreeItem::Scope { name, items } => {
                out.push_str(&format!("{pad}{name} {{\n"));
                render(items, indent + 1, out);
                out.push_str(&format!("{pad}}}\n"));
            }
        }
    }
}

fn render_tree(items: &[TreeItem]) -> String {
    let mut out = String::new();
    render(items, 0, &mut out);
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 512,
        .. ProptestConfig::default()
    })]

    // A shown tree reparses to the same shown text
    #[test]
    fn show_is_a_serialization_fixed_point(items in tree_strategy()) {
        let text = render_tree(&items);
        let mut session = Session::new();
        let root = session.parse(&text, None).unwrap();
        let shown = session.as_str(root, &ShowOptions::default());
        let reparsed = session.parse(&shown, None).unwrap();
        prop_assert_eq!(session.as_str(reparsed, &ShowOptions::default()), shown);
    }

    // Fetching a master against no sources reproduces the master
    #[test]
    fn fetch_without_sources_is_identity(items in tree_strategy()) {
        let text = render_tree(&items);
        let mut session = Session::new();
        let master = session.parse(&text, None).unwrap();
        let fetched = session.fetch(master, &[], &FetchOptions::default()).unwrap();
        prop_assert_eq!(
            session.as_str(fetched.root, &ShowOptions::default()),
            session.as_str(master, &ShowOptions::default())
        );
    }

    // Fetching a master against itself changes nothing
    #[test]
    fn fetch_against_self_is_identity(items in tree_strategy()) {
        let text = render_tree(&items);
        let mut session = Session::new();
        let master = session.parse(&text, None).unwrap();
        let source = session.parse(&text, None).unwrap();
        let fetched = session.fetch(master, &[source], &FetchOptions::default()).unwrap();
        prop_assert_eq!(
            session.as_str(fetched.root, &ShowOptions::default()),
            session.as_str(master, &ShowOptions::default())
        );
    }

    // The diff of a master against itself is empty
    #[test]
    fn diff_against_self_is_empty(items in tree_strategy()) {
        let text = render_tree(&items);
        let mut session = Session::new();
        let master = session.parse(&text, None).unwrap();
        let source = session.parse(&text, None).unwrap();
        let diff = session.fetch_diff(master, &[source]).unwrap();
        prop_assert_eq!(session.as_str(diff, &ShowOptions::default()), "");
    }

    // Every definition is reachable under its reported path
    #[test]
    fn all_definitions_are_reachable(items in tree_strategy()) {
        let text = render_tree(&items);
        let mut session = Session::new();
        let root = session.parse(&text, None).unwrap();
        for (path, _) in session.all_definitions(root, false) {
            let matches = session.get(root, &path).unwrap();
            prop_assert!(!matches.is_empty());
        }
    }

    // Arbitrary input never panics the parser
    #[test]
    fn parser_never_panics(input in "[ -~\n]{0,120}") {
        let mut session = Session::new();
        let _ = session.parse(&input, None);
    }
}
