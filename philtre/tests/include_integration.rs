//! Includes combined with the rest of the pipeline: a master schema
//! assembled from files, then fetched against user input.

use std::fs;

use philtre::{FetchOptions, Session, ShowOptions, Value};

#[test]
fn test_master_assembled_from_include_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("output.phil"),
        "output {\n  prefix = run\n    .type = str\n}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("master.phil"),
        "include file output.phil\ncycles = 3\n  .type = int\n",
    )
    .unwrap();

    let mut session = Session::new();
    let master = session
        .parse_file(&dir.path().join("master.phil"), true)
        .unwrap();
    let user = session
        .parse("output.prefix = final\ncycles = 9", None)
        .unwrap();
    let fetched = session
        .fetch(master, &[user], &FetchOptions::default())
        .unwrap();
    let values = session.extract(fetched.root).unwrap();
    assert_eq!(values.get("cycles"), Some(&Value::Int(9)));
    let output = match values.get("output") {
        Some(Value::Scope(scope)) => scope,
        other => panic!("unexpected output value: {other:?}"),
    };
    assert_eq!(output.get("prefix"), Some(&Value::Str("final".to_string())));
}

#[test]
fn test_nested_includes_expand_depth_first() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("c.phil"), "z = 3\n").unwrap();
    fs::write(dir.path().join("b.phil"), "y = 2\ninclude file c.phil\n").unwrap();
    fs::write(dir.path().join("a.phil"), "x = 1\ninclude file b.phil\n").unwrap();

    let mut session = Session::new();
    let root = session
        .parse_file(&dir.path().join("a.phil"), true)
        .unwrap();
    assert_eq!(
        session.as_str(root, &ShowOptions::default()),
        "x = 1\ny = 2\nz = 3\n"
    );
}

#[test]
fn test_include_cycle_names_both_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.phil"), "include file b.phil\n").unwrap();
    fs::write(dir.path().join("b.phil"), "include file a.phil\n").unwrap();

    let mut session = Session::new();
    let err = session
        .parse_file(&dir.path().join("a.phil"), true)
        .unwrap_err();
    assert!(err.is_include_cycle());
    let message = format!("{err}");
    assert!(message.contains("a.phil"));
    assert!(message.contains("b.phil"));
}

#[test]
fn test_unprocessed_includes_round_trip_through_show() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("main.phil"),
        "include file other.phil\nx = 1\n",
    )
    .unwrap();

    let mut session = Session::new();
    let root = session
        .parse_file(&dir.path().join("main.phil"), false)
        .unwrap();
    assert_eq!(
        session.as_str(root, &ShowOptions::default()),
        "include file other.phil\nx = 1\n"
    );
}
