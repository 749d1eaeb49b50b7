//! Integration tests for arrays, sets and maps.

use std::sync::Arc;

use kryo::io::json::{JsonReader, JsonWriter};
use kryo::io::search_params::SearchParamsReader;
use kryo::types::{
    ArrayType, ArrayTypeOptions, IoType, MapType, MapTypeOptions, SetType, SetTypeOptions, Type,
    Types,
};
use kryo::{read_or_fail, Check, Context, ReportContext, Value};

#[test]
fn test_array_bounds() {
    let ty = ArrayType::new(ArrayTypeOptions::new(Types::boolean(), 3).min_length(1));
    let mut cx = ReportContext::new();

    let id = ty
        .read(&mut cx, &JsonReader::parse("[]").unwrap())
        .unwrap_err();
    assert_eq!(
        cx.get(id),
        Some(&Check::Size { min: 1, max: 3, actual: 0 })
    );

    let id = ty
        .read(&mut cx, &JsonReader::parse("[true, true, true, true, true]").unwrap())
        .unwrap_err();
    assert_eq!(
        cx.get(id),
        Some(&Check::Size { min: 1, max: 3, actual: 4 })
    );

    assert!(ty.is_valid(&Value::List(vec![Value::Boolean(false)])));
    assert!(!ty.is_valid(&Value::List(vec![Value::Null])));
}

#[test]
fn test_array_reports_each_invalid_item() {
    let ty = ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 10));
    let error = read_or_fail(&ty, &JsonReader::parse("[1, -1, 2, 999]").unwrap()).unwrap_err();
    let report = error.report();
    assert!(report.contains("[1]#0"), "{}", report);
    assert!(report.contains("[3]#1"), "{}", report);
    assert!(report.starts_with("#2: 2 nested error(s)"), "{}", report);
}

#[test]
fn test_set_is_canonical() {
    let ty = SetType::new(SetTypeOptions::new(Types::usv_string(), 4));
    let value = read_or_fail(&ty, &JsonReader::parse(r#"["b", "c", "a", "b"]"#).unwrap()).unwrap();
    assert_eq!(
        value,
        Value::Set(vec![Value::from("a"), Value::from("b"), Value::from("c")])
    );

    let mut writer = JsonWriter::new();
    ty.write(
        &mut writer,
        &Value::Set(vec![Value::from("z"), Value::from("y"), Value::from("z")]),
    );
    assert_eq!(writer.into_string(), r#"["y","z"]"#);

    assert!(ty.equals(
        &Value::Set(vec![Value::from("a"), Value::from("b")]),
        &Value::Set(vec![Value::from("b"), Value::from("a"), Value::from("a")]),
    ));
}

#[test]
fn test_set_size_counts_distinct_items() {
    let ty = SetType::new(SetTypeOptions::new(Types::sint32(), 2));
    assert!(read_or_fail(&ty, &JsonReader::parse("[1, 1, 1, 2]").unwrap()).is_ok());
    assert!(read_or_fail(&ty, &JsonReader::parse("[1, 2, 3]").unwrap()).is_err());
}

#[test]
fn test_set_of_arrays() {
    let inner = Arc::new(ArrayType::new(ArrayTypeOptions::new(Types::uint8(), 4)));
    let outer = SetType::new(SetTypeOptions::new(inner, 4));
    let value = read_or_fail(&outer, &JsonReader::parse("[[2, 1], [1], [2, 1]]").unwrap()).unwrap();
    let mut writer = JsonWriter::new();
    outer.write(&mut writer, &value);
    assert_eq!(writer.into_string(), "[[1],[2,1]]");
}

#[test]
fn test_map_string_keys_from_search_params() {
    let ty = MapType::new(
        MapTypeOptions::new(Types::usv_string(), Types::uint32(), 8).assume_string_key(true),
    );
    let reader = SearchParamsReader::new([("a", "1"), ("b", "2"), ("a", "3")]);
    let value = read_or_fail(&ty, &reader).unwrap();
    assert_eq!(
        value,
        Value::Map(vec![
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
        ])
    );
}

#[test]
fn test_map_value_errors_are_wrapped() {
    let ty = MapType::new(
        MapTypeOptions::new(Types::usv_string(), Types::boolean(), 8).assume_string_key(true),
    );
    let mut cx = ReportContext::new();
    let id = ty
        .read(&mut cx, &JsonReader::parse(r#"{"on": true, "off": 0}"#).unwrap())
        .unwrap_err();
    let report = cx.report(id).unwrap();
    assert!(report.contains("off#"), "{}", report);
    let codes: Vec<_> = cx
        .causes(id)
        .into_iter()
        .map(|cause| cx.get(cause).unwrap().code())
        .collect();
    assert!(codes.contains(&"PropertyValue"), "{:?}", codes);
}

#[test]
fn test_map_size() {
    let ty = MapType::new(
        MapTypeOptions::new(Types::usv_string(), Types::null(), 1).assume_string_key(true),
    );
    assert!(read_or_fail(&ty, &JsonReader::parse(r#"{"a": null, "b": null}"#).unwrap()).is_err());
}
