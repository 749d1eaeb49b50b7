//! Tests for validating with shared types from many threads.

use std::sync::Arc;
use std::thread;

use kryo::io::json::JsonReader;
use kryo::types::{
    ArrayType, ArrayTypeOptions, IoType, RecordType, RecordTypeOptions, Type, TypeRef, Types,
};
use kryo::{read_or_fail, ReportContext, TypeRegistry, Value};
use rayon::prelude::*;
use serde_json::json;

fn user_type() -> Arc<RecordType> {
    Arc::new(RecordType::new(
        RecordTypeOptions::new()
            .property("name", Types::usv_string())
            .property("age", Types::uint8()),
    ))
}

#[test]
fn test_parallel_reads_with_independent_contexts() {
    let ty = user_type();
    let outcomes: Vec<(usize, bool, usize)> = (0..200usize)
        .into_par_iter()
        .map(|i| {
            let mut cx = ReportContext::new();
            let age = if i % 2 == 0 { json!(i % 100) } else { json!("old") };
            let reader = JsonReader::from_value(json!({"name": format!("user{}", i), "age": age}));
            let ok = ty.read(&mut cx, &reader).is_ok();
            (i, ok, cx.len())
        })
        .collect();
    for (i, ok, checks) in outcomes {
        assert_eq!(ok, i % 2 == 0, "input {}", i);
        if ok {
            assert_eq!(checks, 0);
        } else {
            assert_eq!(checks, 2, "one BaseType plus its Aggregate for input {}", i);
        }
    }
}

#[test]
fn test_parallel_first_use_of_lazy_type() {
    let ty = Arc::new(ArrayType::lazy(|| {
        ArrayTypeOptions::new(Types::boolean() as TypeRef, 4)
    }));
    let valid: Vec<bool> = (0..64)
        .into_par_iter()
        .map(|i| ty.is_valid(&Value::List(vec![Value::Boolean(i % 2 == 0)])))
        .collect();
    assert!(valid.into_iter().all(|ok| ok));
}

#[test]
fn test_concurrent_registry_access() {
    let registry = TypeRegistry::new();
    let friends = ArrayType::new(ArrayTypeOptions::new(registry.reference("User"), 8));
    registry
        .register(
            "User",
            RecordType::new(
                RecordTypeOptions::new()
                    .property("name", Types::usv_string())
                    .property("friends", Arc::new(friends)),
            ),
        )
        .unwrap();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let registry = registry.clone();
            thread::spawn(move || {
                let user = registry.get("User").unwrap();
                let input = json!({
                    "name": format!("User{}", i),
                    "friends": [{"name": "peer", "friends": []}]
                });
                read_or_fail(&*user, &JsonReader::from_value(input)).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
