// Copyright (c) The confgraph authors.
// Licensed under the MIT License.

#![cfg(test)]

use crate::common::{self, Boxed, Gather, Hook, Padded};

use anyhow::Result;
use confgraph::{ConfigError, GraphBuilder, ParamSource, Value};

#[test]
fn alias_resolves_to_entry_value() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry)
        .build_json(r#"{"a": 5, "b": {"_name": "Box", "value": "a"}}"#)?;

    assert_eq!(graph.get("a")?.as_value(), Some(&Value::from(5)));

    let boxed = graph.get("b")?.downcast::<Boxed>().expect("a Boxed instance");
    assert_eq!(boxed.value.as_value(), Some(&Value::from(5)));

    let sources = graph.provenance("b")?;
    assert_eq!(sources.plugin_name(), Some("Box"));
    assert_eq!(
        sources.sources().and_then(|s| s.get("value")),
        Some(&ParamSource::Alias("a".into()))
    );
    Ok(())
}

#[test]
fn missing_alias_reports_unconfigured() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"b": {"_name": "Box", "value": "a"}}"#)
        .unwrap_err();

    match err {
        ConfigError::Unconfigured(items) => {
            assert_eq!(items.items.len(), 1);
            let missing = &items.items["b"];
            assert!(missing.contains("value"));
        }
        other => panic!("expected Unconfigured, got {other:?}"),
    }
}

#[test]
fn literal_override_bypasses_resolution() -> Result<()> {
    let registry = common::registry();
    // A key named `value` exists, but the trailing-underscore field wins.
    let graph = GraphBuilder::new(&registry)
        .build_json(r#"{"value": 7, "b": {"_name": "Box", "value_": 9}}"#)?;

    let boxed = graph.get("b")?.downcast::<Boxed>().expect("a Boxed instance");
    assert_eq!(boxed.value.as_value(), Some(&Value::from(9)));
    assert_eq!(
        graph.provenance("b")?.sources().and_then(|s| s.get("value")),
        Some(&ParamSource::Literal)
    );
    Ok(())
}

#[test]
fn direct_key_match_fills_parameter() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry)
        .build_json(r#"{"pad": 3, "x": {"_name": "Padded", "value_": 1}}"#)?;

    let padded = graph.get("x")?.downcast::<Padded>().expect("a Padded instance");
    assert_eq!(padded.pad, 3);
    assert_eq!(
        graph.provenance("x")?.sources().and_then(|s| s.get("pad")),
        Some(&ParamSource::Key)
    );
    Ok(())
}

#[test]
fn default_fills_absent_parameter() -> Result<()> {
    let registry = common::registry();
    let graph =
        GraphBuilder::new(&registry).build_json(r#"{"x": {"_name": "Padded", "value_": 1}}"#)?;

    let padded = graph.get("x")?.downcast::<Padded>().expect("a Padded instance");
    assert_eq!(padded.pad, 0);
    assert_eq!(
        graph.provenance("x")?.sources().and_then(|s| s.get("pad")),
        Some(&ParamSource::Default)
    );
    Ok(())
}

#[test]
fn default_does_not_mask_pending_explicit_entry() {
    let registry = common::registry();
    // `pad` is declared explicitly but can never resolve (its alias points
    // nowhere). `x` must wait through tiers 0 and 1 and resolve from the
    // default only in tier 2; the final report names only `pad`.
    let err = GraphBuilder::new(&registry)
        .build_json(
            r#"{
                "pad": {"_name": "Box", "value": "nothing"},
                "x": {"_name": "Padded", "value_": 1}
            }"#,
        )
        .unwrap_err();

    match err {
        ConfigError::Unconfigured(items) => {
            assert_eq!(items.items.len(), 1, "only `pad` may remain: {items}");
            assert!(items.items["pad"].contains("value"));
        }
        other => panic!("expected Unconfigured, got {other:?}"),
    }
}

#[test]
fn forward_references_resolve_regardless_of_order() -> Result<()> {
    let registry = common::registry();
    // `after` sorts ahead of `base` yet depends on it; `zz` sorts last and
    // is depended upon by `after2`. Both declaration orders must resolve.
    for config in [
        r#"{"after": {"_name": "Box", "value": "zz"}, "zz": 1}"#,
        r#"{"zz": 1, "after": {"_name": "Box", "value": "zz"}}"#,
    ] {
        let graph = GraphBuilder::new(&registry).build_json(config)?;
        let boxed = graph
            .get("after")?
            .downcast::<Boxed>()
            .expect("a Boxed instance");
        assert_eq!(boxed.value.as_value(), Some(&Value::from(1)));
    }
    Ok(())
}

#[test]
fn chained_descriptors_resolve_by_fixpoint() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry).build_json(
        r#"{
            "a": {"_name": "Box", "value": "b"},
            "b": {"_name": "Box", "value": "c"},
            "c": 42
        }"#,
    )?;

    let outer = graph.get("a")?.downcast::<Boxed>().expect("a Boxed instance");
    let inner = outer.value.downcast::<Boxed>().expect("a nested Boxed");
    assert_eq!(inner.value.as_value(), Some(&Value::from(42)));
    Ok(())
}

#[test]
fn list_alias_needs_every_key() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry)
        .build_json(r#"{"x": 1, "y": 2, "c": {"_name": "Gather", "items": ["x", "y"]}}"#)?;

    let gathered = graph.get("c")?.downcast::<Gather>().expect("a Gather instance");
    let values: Vec<_> = gathered
        .items
        .iter()
        .map(|i| i.as_value().cloned().expect("scalar element"))
        .collect();
    assert_eq!(values, vec![Value::from(1), Value::from(2)]);
    assert_eq!(
        graph.provenance("c")?.sources().and_then(|s| s.get("items")),
        Some(&ParamSource::AliasList(vec!["x".into(), "y".into()]))
    );

    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"x": 1, "c": {"_name": "Gather", "items": ["x", "zz"]}}"#)
        .unwrap_err();
    match err {
        ConfigError::Unconfigured(items) => assert!(items.items["c"].contains("items")),
        other => panic!("expected Unconfigured, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unregistered_type_fails_naming_key_and_type() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"b": {"_name": "Nope"}}"#)
        .unwrap_err();
    match err {
        ConfigError::UnknownType { key, name } => {
            assert_eq!(key, "b");
            assert_eq!(name, "Nope");
        }
        other => panic!("expected UnknownType, got {other:?}"),
    }
}

#[test]
fn constructor_failure_aborts_the_run() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"f": {"_name": "Fail"}}"#)
        .unwrap_err();
    match err {
        ConfigError::Constructor { key, source } => {
            assert_eq!(key, "f");
            assert!(source.to_string().contains("constructor exploded"));
        }
        other => panic!("expected Constructor, got {other:?}"),
    }
}

#[test]
fn self_reference_binds_graph_handle() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry).build_json(r#"{"a": 5, "h": {"_name": "Hook"}}"#)?;

    let hook = graph.get("h")?.downcast::<Hook>().expect("a Hook instance");
    assert!(hook.early_read_was_not_ready);
    assert_eq!(hook.graph.get("a")?.as_value(), Some(&Value::from(5)));
    assert!(hook.graph.contains("h"));
    assert_eq!(
        graph
            .provenance("h")?
            .sources()
            .and_then(|s| s.get("experiment_graph")),
        Some(&ParamSource::Resolver)
    );
    Ok(())
}

#[test]
fn provenance_is_deterministic_across_runs() -> Result<()> {
    let registry = common::registry();
    let config = r#"{
        "c": 42,
        "b": {"_name": "Box", "value": "c"},
        "a": {"_name": "Padded", "value": "b"},
        "l": [1, 2],
        "g": {"_name": "Gather", "items": ["c", "l"]}
    }"#;

    let first = GraphBuilder::new(&registry).build_json(config)?;
    let second = GraphBuilder::new(&registry).build_json(config)?;

    assert_eq!(first.keys()?, second.keys()?);
    for key in first.keys()? {
        let lhs = first.provenance(&key)?;
        let rhs = second.provenance(&key)?;
        assert_eq!(lhs.plugin_name(), rhs.plugin_name(), "key {key}");
        assert_eq!(
            lhs.sources().cloned(),
            rhs.sources().cloned(),
            "key {key}"
        );
    }
    Ok(())
}

#[test]
fn substitution_applies_before_classification() -> Result<()> {
    let registry = common::registry();
    let graph = GraphBuilder::new(&registry)
        .set_var("HOME", "/home/experiments")
        .build_json(r#"{"path": "HOME/data.csv", "paths": ["HOME/a", 7]}"#)?;

    assert_eq!(
        graph.get("path")?.as_value(),
        Some(&Value::from("/home/experiments/data.csv"))
    );
    let list = graph.get("paths")?;
    let items = list.as_list().expect("a list entry");
    assert_eq!(items[0].as_value(), Some(&Value::from("/home/experiments/a")));
    assert_eq!(items[1].as_value(), Some(&Value::from(7)));
    Ok(())
}

#[test]
fn descriptor_without_name_field_is_malformed() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"b": {"value": "a"}}"#)
        .unwrap_err();
    match err {
        ConfigError::MalformedEntry { key, .. } => assert_eq!(key, "b"),
        other => panic!("expected MalformedEntry, got {other:?}"),
    }
}

#[test]
fn nested_list_entry_is_malformed() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"l": [1, [2]]}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::MalformedEntry { .. }));
}

#[test]
fn unmarked_non_string_parameter_is_malformed() {
    let registry = common::registry();
    // A bare number is neither a literal override nor a key alias.
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"b": {"_name": "Box", "value": 9}}"#)
        .unwrap_err();
    match err {
        ConfigError::MalformedEntry { key, reason } => {
            assert_eq!(key, "b");
            assert!(reason.contains("value_"), "hint missing from: {reason}");
        }
        other => panic!("expected MalformedEntry, got {other:?}"),
    }
}

#[test]
fn non_string_element_in_list_parameter_is_malformed() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"b": {"_name": "Gather", "items": ["x", 3]}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::MalformedEntry { .. }));
}

#[test]
fn top_level_must_be_a_mapping() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry).build(&Value::from(5)).unwrap_err();
    assert!(matches!(err, ConfigError::MalformedEntry { .. }));
}

#[test]
fn malformed_entries_fail_before_any_construction() {
    let registry = common::registry();
    // The malformed list must surface even though the descriptor next to it
    // could never resolve either.
    let err = GraphBuilder::new(&registry)
        .build_json(r#"{"l": [1, [2]], "b": {"_name": "Box", "value": "zz"}}"#)
        .unwrap_err();
    assert!(matches!(err, ConfigError::MalformedEntry { .. }));
}

#[test]
fn aggregate_report_lists_every_stuck_key() {
    let registry = common::registry();
    let err = GraphBuilder::new(&registry)
        .build_json(
            r#"{
                "b": {"_name": "Box", "value": "missing1"},
                "c": {"_name": "Box", "value": "missing2"}
            }"#,
        )
        .unwrap_err();
    match err {
        ConfigError::Unconfigured(items) => {
            assert_eq!(items.items.len(), 2);
            assert!(items.items.contains_key("b"));
            assert!(items.items.contains_key("c"));
        }
        other => panic!("expected Unconfigured, got {other:?}"),
    }
}
