//! Integration tests for tagged, try and literal unions.

use std::sync::Arc;

use kryo::io::bson::BsonReader;
use kryo::io::json::{JsonReader, JsonWriter};
use kryo::types::{
    IoType, LiteralType, LiteralUnionType, RecordType, RecordTypeOptions, TaggedUnionType,
    TryUnionType, TsEnumType, Type, TypeRef, Types,
};
use kryo::{read_or_fail, CaseStyle, Check, ReportContext, Value};
use serde_json::json;

fn node_type() -> TaggedUnionType {
    let kind = Arc::new(
        TsEnumType::new([("File", Value::from(0)), ("Directory", Value::from(1))])
            .change_case(CaseStyle::KebabCase),
    );
    let file = RecordType::new(
        RecordTypeOptions::new()
            .property("type", Arc::new(LiteralType::new(kind.clone(), Value::from(0))))
            .property("name", Types::usv_string())
            .property("size", Types::uint53()),
    );
    let directory = RecordType::new(
        RecordTypeOptions::new()
            .property("type", Arc::new(LiteralType::new(kind.clone(), Value::from(1))))
            .property("name", Types::usv_string()),
    );
    TaggedUnionType::new("type", vec![Arc::new(file), Arc::new(directory)])
}

#[test]
fn test_tagged_union_dispatches_on_serialized_tag() {
    let ty = node_type();
    let value = read_or_fail(
        &ty,
        &JsonReader::from_value(json!({"name": "src", "type": "directory"})),
    )
    .unwrap();
    assert_eq!(
        value,
        Value::record([("type", Value::from(1)), ("name", Value::from("src"))])
    );

    let mut writer = JsonWriter::new();
    ty.write(&mut writer, &value);
    assert_eq!(writer.into_string(), r#"{"type":"directory","name":"src"}"#);
}

#[test]
fn test_tagged_union_variant_error_is_not_a_tag_error() {
    let ty = node_type();
    let mut cx = ReportContext::new();
    let id = ty
        .read(&mut cx, &JsonReader::from_value(json!({"type": "file", "name": "a"})))
        .unwrap_err();
    let Some(Check::UnionMatch { cause }) = cx.get(id) else {
        panic!("expected UnionMatch, got {:?}", cx.get(id));
    };
    match cx.get(*cause) {
        Some(Check::PropertyKey { missing, .. }) => assert_eq!(missing, &vec!["size".to_string()]),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_tagged_union_unknown_and_missing_tag() {
    let ty = node_type();
    let mut cx = ReportContext::new();
    let id = ty
        .read(&mut cx, &JsonReader::from_value(json!({"type": "link"})))
        .unwrap_err();
    assert_eq!(cx.get(id).unwrap().code(), "UnionTagValue");

    let id = ty
        .test(&mut cx, &Value::record([("name", Value::from("x"))]))
        .unwrap_err();
    assert_eq!(cx.get(id).unwrap().code(), "UnionTagPresent");
}

#[test]
fn test_tagged_union_from_bson() {
    let ty = node_type();
    let document = bson::doc! {"type": "file", "name": "a.txt", "size": 12i32};
    let value = read_or_fail(&ty, &BsonReader::from_document(document)).unwrap();
    assert_eq!(ty.variant_of(&value).map(|v| v.out_key("size")), Some(Some("size")));
}

fn shape_type() -> TryUnionType {
    let rectangle = RecordType::new(
        RecordTypeOptions::new()
            .property("width", Types::float64())
            .property("height", Types::float64()),
    );
    let circle = RecordType::new(RecordTypeOptions::new().property("radius", Types::float64()));
    TryUnionType::new(vec![Arc::new(rectangle) as TypeRef, Arc::new(circle)])
}

#[test]
fn test_try_union_first_match() {
    let ty = shape_type();
    let rectangle = read_or_fail(&ty, &JsonReader::from_value(json!({"width": 10, "height": 20})))
        .unwrap();
    assert_eq!(rectangle.as_record().unwrap().len(), 2);

    let circle = read_or_fail(&ty, &JsonReader::from_value(json!({"radius": 15}))).unwrap();
    assert_eq!(circle, Value::record([("radius", Value::from(15))]));
}

#[test]
fn test_try_union_no_match_aggregates_variants() {
    let ty = shape_type();
    let mut cx = ReportContext::new();
    let id = ty
        .read(&mut cx, &JsonReader::from_value(json!({"side": 3})))
        .unwrap_err();
    let Some(Check::UnionMatch { cause }) = cx.get(id) else {
        panic!("expected UnionMatch");
    };
    match cx.get(*cause) {
        Some(Check::Aggregate { children }) => {
            assert_eq!(children.len(), 2);
            for child in children {
                assert_eq!(cx.get(*child).unwrap().code(), "PropertyKey");
            }
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_literal_union_membership() {
    let ty = LiteralUnionType::new(
        Types::usv_string(),
        vec![Value::from("red"), Value::from("green")],
    );
    assert_eq!(
        read_or_fail(&ty, &JsonReader::parse("\"green\"").unwrap()).unwrap(),
        Value::from("green")
    );
    let mut cx = ReportContext::new();
    let id = ty.test(&mut cx, &Value::from("blue")).unwrap_err();
    assert_eq!(cx.get(id).unwrap().code(), "LiteralValue");
}
