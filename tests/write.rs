use datum_query as dq;
use dq::{Datum, Error, ParseError, Query, Type, WriteError};
use pretty_assertions::assert_eq;

fn q(spec: &str) -> Query {
    dq::parse(spec).unwrap()
}

fn json(text: &str) -> Datum {
    Datum::from_json(text).unwrap()
}

#[test]
fn test_set_inserts_missing_leaf() {
    let d = json(r#"{"a": {}}"#);
    let out = d.set(&q("a.b"), 1).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{"b":1}}"#);
    assert_eq!(d.to_string(), r#"{"a":{}}"#);
}

#[test]
fn test_existing_leaf_needs_overwrite() {
    let d = json(r#"{"a": 1}"#);
    assert!(matches!(
        d.set(&q("a"), 2),
        Err(Error::Write(WriteError::ImplicitOverwrite(_)))
    ));
    assert_eq!(d.set(&q("=a"), 2).unwrap().to_string(), r#"{"a":2}"#);
    let over = q("a").with_overwrite().unwrap();
    assert_eq!(d.set(&over, 3).unwrap().to_string(), r#"{"a":3}"#);
}

#[test]
fn test_missing_intermediate_needs_make() {
    let d = json(r#"{"a": {}}"#);
    assert!(matches!(
        d.set(&q("a.b.c"), 1),
        Err(Error::Write(WriteError::MissingKey(k))) if k == "b"
    ));
    let out = d.set(&q("a.$b.c"), 1).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{"b":{"c":1}}}"#);
    let made = q("a.b.c").next().with_make().unwrap().root();
    assert_eq!(d.set(&made, 1).unwrap(), out);
}

#[test]
fn test_array_index_overwrites_in_place() {
    let d = json(r#"{"a": [1, 2]}"#);
    assert_eq!(d.set(&q("a.1"), 9).unwrap().to_string(), r#"{"a":[1,9]}"#);
    assert!(matches!(
        d.set(&q("a.5"), 9),
        Err(Error::Write(WriteError::MissingKey(k))) if k == "5"
    ));
}

#[test]
fn test_index_zero_on_zero_value_synthesizes_an_array() {
    assert_eq!(Datum::nil().set(&q("0"), "v").unwrap().to_string(), r#"["v"]"#);
    let d = json(r#"{"a": []}"#);
    assert_eq!(d.set(&q("a.0"), 1).unwrap().to_string(), r#"{"a":[1]}"#);
    let out = json("{}").set(&q("$a.0.b"), true).unwrap();
    assert_eq!(out.to_string(), r#"{"a":[{"b":true}]}"#);
}

#[test]
fn test_append_creates_and_pushes() {
    let d = json(r#"{"a": [1]}"#);
    assert_eq!(d.set(&q("a.+"), 2).unwrap().to_string(), r#"{"a":[1,2]}"#);
    let out = json("{}").set(&q("$list.+.name"), "x").unwrap();
    assert_eq!(out.to_string(), r#"{"list":[{"name":"x"}]}"#);
    let out = out.set(&q("$list.+.name"), "y").unwrap();
    assert_eq!(out.to_string(), r#"{"list":[{"name":"x"},{"name":"y"}]}"#);
}

#[test]
fn test_kind_mismatch_is_a_type_cast() {
    let d = json(r#"{"a": [1]}"#);
    match d.set(&q("a.b"), 1) {
        Err(Error::Write(WriteError::TypeCast { expected, found })) => {
            assert_eq!(expected, Type::OBJECT);
            assert_eq!(found.to_string(), "int[]");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(
        json(r#"{"a": "s"}"#).set(&q("a.+"), 1),
        Err(Error::Write(WriteError::TypeCast { .. }))
    ));
}

#[test]
fn test_dynamic_key_write() {
    let d = json(r#"{"k": "name", "i": 0, "list": [1]}"#);
    let out = d.set(&q("[k]"), "v").unwrap();
    assert_eq!(out.to_string(), r#"{"i":0,"k":"name","list":[1],"name":"v"}"#);
    let out = d.set(&q("list.[i]"), 5).unwrap();
    assert_eq!(out.to_string(), r#"{"i":0,"k":"name","list":[5]}"#);
}

#[test]
fn test_set_rejects_valueless_queries() {
    let d = json(r#"{"a": 1}"#);
    assert!(matches!(
        d.set(&q("!a"), 1),
        Err(Error::Write(WriteError::UnexpectedValue(_)))
    ));
    assert!(matches!(
        d.set(&q("a>b"), 1),
        Err(Error::Parse(ParseError::NotWritable(_)))
    ));
}

#[test]
fn test_delete_removes_and_shifts() {
    let d = json(r#"{"a": {"b": 1, "c": 2}, "l": [1, 2, 3]}"#);
    let out = d.delete(&q("!a.b")).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{"c":2},"l":[1,2,3]}"#);
    let out = out.delete(&q("!l.1")).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{"c":2},"l":[1,3]}"#);
}

#[test]
fn test_delete_of_absent_target_is_a_no_op() {
    let d = json(r#"{"a": {"b": 1}}"#);
    for spec in ["!a.z", "!x.y", "!a.b.c", "!a.3"] {
        let out = d.delete(&q(spec)).unwrap();
        assert!(out.ptr_eq(&d), "{spec} changed the document");
    }
}

#[test]
fn test_delete_self_leaves_nil() {
    let d = json(r#"{"a": {"b": 1}}"#);
    assert_eq!(d.delete(&q("!a.#")).unwrap().to_string(), r#"{"a":null}"#);
}

#[test]
fn test_move_value() {
    let d = json(r#"{"a": {"b": 1}}"#);
    let out = d.move_value(&q("a.b>c")).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{},"c":1}"#);
    let out = d.move_value(&q("a.b>$x.y")).unwrap();
    assert_eq!(out.to_string(), r#"{"a":{},"x":{"y":1}}"#);
    assert!(matches!(
        d.move_value(&q("a.b")),
        Err(Error::Write(WriteError::UnsegmentedMove(_)))
    ));
    assert!(d.move_value(&q("a.z>c")).is_err());
}

#[test]
fn test_move_keeps_commands_written_before_the_marker() {
    let d = json(r#"{"a": 1, "b": 2}"#);
    assert_eq!(d.move_value(&q("=a>b")).unwrap().to_string(), r#"{"b":1}"#);
    assert_eq!(d.move_value(&q("a>=b")).unwrap().to_string(), r#"{"b":1}"#);
    assert!(matches!(
        d.move_value(&q("a>b")),
        Err(Error::Write(WriteError::ImplicitOverwrite(_)))
    ));
    let d = json(r#"{"a": 1}"#);
    assert_eq!(
        d.move_value(&q("$a>x.y")).unwrap().to_string(),
        r#"{"x":{"y":1}}"#
    );
}

#[test]
fn test_apply_dispatches_on_the_query() {
    let d = json(r#"{"a": 1}"#);
    assert_eq!(
        d.apply(&q("b"), Some(Datum::int(2))).unwrap().to_string(),
        r#"{"a":1,"b":2}"#
    );
    assert_eq!(d.apply(&q("!a"), None).unwrap().to_string(), "{}");
    assert_eq!(d.apply(&q("a>b"), None).unwrap().to_string(), r#"{"b":1}"#);
    for (spec, value) in [("!a", Some(Datum::nil())), ("a>b", Some(Datum::nil())), ("b", None)] {
        assert!(matches!(
            d.apply(&q(spec), value),
            Err(Error::Write(WriteError::UnexpectedValue(_)))
        ));
    }
}

#[test]
fn test_writes_share_untouched_branches() {
    let d = json(r#"{"a": {"x": 1}, "b": {"y": 2}}"#);
    let out = d.set(&q("a.z"), 3).unwrap();
    let before = d.get(&q("b")).unwrap();
    let after = out.get(&q("b")).unwrap();
    assert!(before.ptr_eq(&after));
    assert!(!d.get(&q("a")).unwrap().ptr_eq(&out.get(&q("a")).unwrap()));
    assert_eq!(d.to_string(), r#"{"a":{"x":1},"b":{"y":2}}"#);
}
