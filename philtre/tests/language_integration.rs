//! End-to-end flows: parse a master schema, merge user input, extract
//! values, modify them, and serialize back.

use philtre::{FetchOptions, Session, ShowOptions, Value};

const MASTER: &str = "\
output {
  prefix = run
    .type = str
  directory = None
    .type = path
  verbose = False
    .type = bool
}
refinement {
  cycles = 3
    .type = int(value_min=1)
  damping = 0.5
    .type = float
  method = *fast thorough legacy
    .type = choice
}
";

fn show(session: &Session, root: philtre::NodeId) -> String {
    session.as_str(root, &ShowOptions::default())
}

#[test]
fn test_master_defaults_extract() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let values = session.extract(master).unwrap();

    let output = match values.get("output") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected output value: {other:?}"),
    };
    assert_eq!(output.get("prefix"), Some(&Value::Str("run".to_string())));
    assert_eq!(output.get("directory"), Some(&Value::None));
    assert_eq!(output.get("verbose"), Some(&Value::Bool(false)));

    let refinement = match values.get("refinement") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected refinement value: {other:?}"),
    };
    assert_eq!(refinement.get("cycles"), Some(&Value::Int(3)));
    assert_eq!(refinement.get("damping"), Some(&Value::Float(0.5)));
    assert_eq!(
        refinement.get("method"),
        Some(&Value::Str("fast".to_string()))
    );
}

#[test]
fn test_fetch_then_extract() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let user = session
        .parse(
            "refinement.cycles = 10\nrefinement.method = thorough\noutput.verbose = yes",
            None,
        )
        .unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let values = session.extract(fetched.root).unwrap();

    let refinement = match values.get("refinement") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected refinement value: {other:?}"),
    };
    assert_eq!(refinement.get("cycles"), Some(&Value::Int(10)));
    assert_eq!(
        refinement.get("method"),
        Some(&Value::Str("thorough".to_string()))
    );
    let output = match values.get("output") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected output value: {other:?}"),
    };
    assert_eq!(output.get("verbose"), Some(&Value::Bool(true)));
}

#[test]
fn test_out_of_range_value_is_rejected_at_extract() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let user = session.parse("refinement.cycles = 0", None).unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let err = session.extract(fetched.root).unwrap_err();
    assert!(format!("{err}").contains("less than the minimum"));
}

#[test]
fn test_modify_and_format_round_trip() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let mut values = session.extract(master).unwrap();

    let refinement = match values.get_mut("refinement") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected refinement value: {other:?}"),
    };
    refinement.set("cycles", Value::Int(25)).unwrap();

    let formatted = session.format(master, &values).unwrap();
    let reread = session.extract(formatted).unwrap();
    let refinement = match reread.get("refinement") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected refinement value: {other:?}"),
    };
    assert_eq!(refinement.get("cycles"), Some(&Value::Int(25)));
}

#[test]
fn test_diff_captures_only_user_changes() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let user = session
        .parse("refinement.cycles = 10\noutput.prefix = run", None)
        .unwrap();
    let diff = session.fetch_diff(master, &[user]).unwrap();
    assert_eq!(show(&session, diff), "refinement {\n  cycles = 10\n}\n");
}

#[test]
fn test_diff_reapplies_onto_master() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let user = session
        .parse("refinement.damping = 0.9\noutput.verbose = True", None)
        .unwrap();
    let diff = session.fetch_diff(master, &[user]).unwrap();
    let full = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let reapplied = session
        .fetch(master, &[diff], &FetchOptions::default())
        .unwrap();
    assert_eq!(show(&session, reapplied.root), show(&session, full.root));
}

#[test]
fn test_multiple_scope_collection() {
    let mut session = Session::new();
    let master = session
        .parse(
            "restraint\n  .multiple = True\n{\n  selection = None\n    .type = str\n  weight = 1.0\n    .type = float\n}",
            None,
        )
        .unwrap();
    let user = session
        .parse(
            "restraint {\n  selection = chain_a\n}\nrestraint {\n  selection = chain_b\n  weight = 2.5\n}",
            None,
        )
        .unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let values = session.extract(fetched.root).unwrap();
    let list = match values.get("restraint") {
        Some(Value::List(list)) => list,
        other => panic!("unexpected restraint value: {other:?}"),
    };
    assert_eq!(list.len(), 2);
    let second = match &list.values()[1] {
        Value::Scope(scope) => scope,
        other => panic!("unexpected element: {other:?}"),
    };
    assert_eq!(second.get("weight"), Some(&Value::Float(2.5)));
}

#[test]
fn test_multiple_without_input_extracts_empty_list() {
    let mut session = Session::new();
    let master = session
        .parse("x = None\n  .type = int\n  .multiple = True", None)
        .unwrap();
    let fetched = session
        .fetch(master, &[], &FetchOptions::default())
        .unwrap();
    let values = session.extract(fetched.root).unwrap();
    match values.get("x") {
        Some(Value::List(list)) => assert!(list.is_empty()),
        other => panic!("unexpected x value: {other:?}"),
    }
}

#[test]
fn test_environment_fallback_substitution() {
    // no lexical match for HOME, so the environment supplies it
    std::env::set_var("PHILTRE_IT_HOME", "/root");
    let mut session = Session::new();
    let master = session.parse("data = None", None).unwrap();
    let user = session
        .parse("data = $PHILTRE_IT_HOME/data", None)
        .unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    assert_eq!(show(&session, fetched.root), "data = \"/root/data\"\n");
}

#[test]
fn test_lexical_substitution_prefers_earlier_definitions() {
    let mut session = Session::new();
    let master = session
        .parse("root = None\nname = None\nfull = None", None)
        .unwrap();
    let user = session
        .parse("root = /data\nname = job1\nfull = $(root)/$(name)", None)
        .unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let text = show(&session, fetched.root);
    assert!(text.contains("full = \"/data/job1\""), "{text}");
}

#[test]
fn test_unused_definitions_are_reported() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let user = session
        .parse("refinement.cycles = 4\nrefinement.cylces = 5", None)
        .unwrap();
    let options = FetchOptions {
        track_unused_definitions: true,
        ..FetchOptions::default()
    };
    let fetched = session.fetch(master, &[user], &options).unwrap();
    let unused: Vec<String> = fetched.unused.iter().map(ToString::to_string).collect();
    assert_eq!(unused.len(), 1);
    assert!(unused[0].starts_with("refinement.cylces"));
}

#[test]
fn test_show_attribute_levels() {
    let mut session = Session::new();
    let root = session
        .parse(
            "x = 1\n  .type = int\n  .help = How many\n  .expert_level = 2",
            None,
        )
        .unwrap();
    let plain = session.as_str(root, &ShowOptions::default());
    assert_eq!(plain, "x = 1\n");
    let with_help = session.as_str(
        root,
        &ShowOptions {
            attributes_level: 1,
            ..ShowOptions::default()
        },
    );
    assert!(with_help.contains(".help"));
    assert!(!with_help.contains(".type"));
    let expert_hidden = session.as_str(
        root,
        &ShowOptions {
            expert_level: Some(1),
            ..ShowOptions::default()
        },
    );
    assert_eq!(expert_hidden, "");
}

#[test]
fn test_json_export_of_extract() {
    let mut session = Session::new();
    let master = session.parse(MASTER, None).unwrap();
    let values = session.extract(master).unwrap();
    let json = serde_json::to_value(&values).unwrap();
    assert_eq!(json["refinement"]["cycles"], serde_json::json!(3));
    assert_eq!(json["output"]["directory"], serde_json::Value::Null);
}
